use cotransfer::{Channel, Producer};
use log::{info, warn};

fn greet(sink: &mut Producer<'_, String>) {
    for _ in 0..2 {
        match sink.receive() {
            Ok(word) => println!("get {} from main()", word),
            Err(e) => warn!("Nothing to receive: {}", e),
        }
        sink.suspend();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut source = Channel::new(greet);

    for word in ["hello", "world"] {
        println!("pass {} to greet()", word);
        source.send(word.to_string()).expect("Failed to send word");
    }

    source.close().expect("Failed to close channel");
    info!("Channel closed, {:?}", source.stats());
}
