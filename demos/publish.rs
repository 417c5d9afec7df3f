//! A bound publisher feeding an in-process subscriber.
//!
//! Run with: RUST_LOG=debug cargo run --example publish

use pubpack::{values, Context, Event, FnSink, PackOptions, PubSocket, Publisher};
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = Context::global();
    let subscriber = ctx.subscribe("tcp://localhost:5555")?;

    let sink = FnSink(|event: Event| match event {
        Event::Status { connected, mode } => {
            println!("status: connected={} mode={:?}", connected, mode)
        }
        Event::Error(message) => println!("error: {}", message),
        Event::Sent(bytes) => println!("sent {} bytes", bytes),
    });
    let mut publisher = Publisher::new(PubSocket::new(&ctx), PackOptions::new(), sink);

    // endpoint, format, mode - as a host would pass them at load time
    publisher.load(&values!["tcp://*:5555", "[Cf]", "bind"])?;

    for frame in 0..3 {
        publisher.send(&values![frame, frame as f64 * 0.25, frame + 1, 1.0])?;
    }

    // A second bind is rejected and reported
    let _ = publisher.connect("tcp://localhost:5556");

    // A malformed format aborts the send
    publisher.set_format("C]");
    let _ = publisher.send(&values![1]);

    publisher.unbind()?;

    for message in subscriber.drain() {
        println!("received {:?}", message);
    }

    Ok(())
}
