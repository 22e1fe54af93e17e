use std::time::Duration;

use canstream::CanSocket;

fn main() {
    env_logger::init();

    let mut bus = CanSocket::new();
    bus.connect("vcan0").unwrap();

    loop {
        bus.notifier()
            .unwrap()
            .wait_readable(Some(Duration::from_millis(500)))
            .unwrap();

        match bus.read_frame() {
            Ok(Some((frame, time))) => {
                log::info!("[{:?}] {:X}", time.system_time(), frame);
                break;
            }
            Ok(None) => continue,
            Err(e) => {
                log::error!("Error: {}", e);
                break;
            }
        }
    }
}
