use scpikit::{Backend, DEFAULT_TIMEOUT, InstrumentManager};

fn main() {
    let resource = "TCPIP0::192.168.127.42::5025::SOCKET";

    // The native backend needs no VISA installation, but cannot discover raw sockets. So we tell
    // it about the instrument we want to talk to.
    let backend = Backend::Native {
        resources: vec![resource.to_string()],
    };
    let mut manager = InstrumentManager::with_backend(backend).unwrap();
    println!("Resources: {:?}", manager.list_resources().unwrap());

    // Open the instrument and query its name
    let mut inst = manager
        .open_scpi_instrument(resource, DEFAULT_TIMEOUT)
        .unwrap();
    println!("Instrument ID: {}", inst.idn().unwrap());

    // Reset the instrument and read back a voltage
    inst.write("*RST").unwrap();
    println!("Voltage: {}", inst.query(":MEAS:VOLT?").unwrap());

    // Closing is optional, the session is closed when `inst` goes out of scope.
    inst.close();
}
