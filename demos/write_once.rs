use std::env;

use canstream::{CanFdFrame, CanSocket};

fn main() {
    env_logger::init();

    let mut bus = CanSocket::new();
    bus.connect("vcan0").unwrap();

    // payload can be passed as a hex string, e.g. `write_once deadbeef`
    let data = match env::args().nth(1) {
        Some(arg) => hex::decode(arg).expect("payload must be a hex string"),
        None => vec![222, 173, 190, 239],
    };

    let id: u32 = 123;
    let frame = CanFdFrame::new(id, &data, false, false).unwrap();
    match bus.write_frame(&frame) {
        Ok(()) => log::info!("Frame Send Success"),
        Err(e) => log::error!("Frame Send Error {}", e),
    }
}
