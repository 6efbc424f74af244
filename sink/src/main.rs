use cotransfer::{Channel, ChannelConfig, Producer};
use log::info;

const COUNT: i32 = 10;

/// Walks the incoming values with an explicit iterator.
#[allow(clippy::while_let_on_iterator)]
fn retrieve_iter(sink: &mut Producer<'_, i32>) {
    let mut values = sink.incoming();
    while let Some(value) = values.next() {
        println!("retrieve {}", value);
    }
}

/// Walks the incoming values with a `for` loop.
fn retrieve_for(sink: &mut Producer<'_, i32>) {
    for value in sink.incoming() {
        println!("retrieve {}", value);
    }
}

/// Reads a fixed number of values, handing control back after each one.
fn retrieve_counted(sink: &mut Producer<'_, i32>) {
    for _ in 0..COUNT {
        if let Ok(value) = sink.receive() {
            println!("retrieve {}", value);
        }
        sink.suspend();
    }
}

fn drive(name: &str, body: fn(&mut Producer<'_, i32>)) {
    info!("=== {} ===", name);

    let config = ChannelConfig::new().with_stack_size(64 * 1024).with_name(name);
    let mut source = Channel::with_config(config, body).expect("Failed to create channel");

    for i in 0..COUNT {
        source.send(i).expect("Failed to send value");
    }
    source.close().expect("Failed to close channel");

    info!("{} finished, {:?}", name, source.stats());
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    drive("iterator", retrieve_iter);
    drive("for-loop", retrieve_for);
    drive("counted", retrieve_counted);
}
