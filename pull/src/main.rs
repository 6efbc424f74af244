use cotransfer::{Channel, Producer};
use log::info;

fn numbers(sink: &mut Producer<'_, i32>) {
    println!("coroutine 1");
    sink.yield_(1);
    println!("coroutine 2");
    sink.yield_(2);
    println!("coroutine 3");
    sink.yield_(3);
}

fn main() {
    env_logger::init();

    let mut source = Channel::new(numbers);

    // Run the body up to its first value.
    source.resume().expect("Failed to start producer");

    while source.is_open() {
        let value = source.take_current().expect("Producer suspended without a value");
        println!("move to coroutine-function {}", value);
        source.resume().expect("Failed to resume producer");
        println!("back from coroutine-function");
    }

    info!("Producer finished, {:?}", source.stats());
}
