//! Tests for the [`ScpiInstrument`] facade.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use scpikit::{Instrument, InstrumentError, LoopbackInterfaceString, ScpiInstrument};

// Type alias for a SCPI instrument on top of the loopback interface.
type ScpiLbk = ScpiInstrument<LoopbackInterfaceString>;

/// Create a new SCPI instrument with the given input and output commands.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> ScpiLbk {
    let h2i: Vec<String> = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterfaceString::new(h2i, i2h, "\n");
    ScpiInstrument::new(interface, "USB0::0x0957::0x1796::MY1234::INSTR")
}

#[fixture]
fn emp_inst() -> ScpiLbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_resource_name(emp_inst: ScpiLbk) {
    assert_eq!(
        emp_inst.resource_name(),
        "USB0::0x0957::0x1796::MY1234::INSTR"
    );
    assert!(emp_inst.is_open());
}

#[rstest]
fn test_write() {
    let mut inst = crt_inst(vec!["*RST", ":CONF:VOLT:DC"], vec![]);
    inst.write("*RST").unwrap();
    inst.write(":CONF:VOLT:DC").unwrap();
}

/// Reading returns the response as it was received, apart from the terminator.
#[rstest]
fn test_read() {
    let mut inst = crt_inst(vec![], vec!["  +1.0E+00 "]);
    assert_eq!(inst.read().unwrap(), "  +1.0E+00 ");
}

#[rstest]
#[case("+1.234E+00", "+1.234E+00")]
#[case("  +1.234E+00  ", "+1.234E+00")]
#[case("\t0.5\r", "0.5")]
#[case("", "")]
fn test_query_trims(#[case] response: &str, #[case] expected: &str) {
    let mut inst = crt_inst(vec![":MEAS:VOLT?"], vec![response]);
    assert_eq!(inst.query(":MEAS:VOLT?").unwrap(), expected);
}

/// A query gives the same as writing and reading right after, apart from the whitespace.
#[rstest]
fn test_query_equals_write_then_read() {
    let resp = " ACME,DMM1000,1234,1.0 ";
    let mut inst_q = crt_inst(vec!["*IDN?"], vec![resp]);
    let mut inst_wr = crt_inst(vec!["*IDN?"], vec![resp]);

    let queried = inst_q.query("*IDN?").unwrap();
    inst_wr.write("*IDN?").unwrap();
    let read = inst_wr.read().unwrap();

    assert_eq!(queried, read.trim());
}

#[rstest]
fn test_idn() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["ACME,DMM1000,1234,1.0"]);
    assert_eq!(inst.idn().unwrap(), "ACME,DMM1000,1234,1.0");
}

/// A query that times out is reported as a query timeout naming the command.
#[rstest]
fn test_query_timeout() {
    let port = VecDeque::from(b"no terminator".to_vec());
    let interface = Instrument::new(port, Duration::ZERO);
    let mut inst = ScpiInstrument::new(interface, "TCPIP0::10.0.0.2::5025::SOCKET");
    match inst.query(":READ?") {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query, ":READ?");
            assert_eq!(timeout, Duration::ZERO);
        }
        _ => panic!("Expected a query timeout."),
    }
}

#[rstest]
fn test_close(mut emp_inst: ScpiLbk) {
    emp_inst.close();
    assert!(!emp_inst.is_open());
    assert!(emp_inst.interface().is_closed());
}

/// Closing twice is harmless.
#[rstest]
fn test_close_twice(mut emp_inst: ScpiLbk) {
    emp_inst.close();
    emp_inst.close();
    assert!(!emp_inst.is_open());
}

/// Errors while closing are swallowed.
#[rstest]
fn test_close_error_is_discarded() {
    let interface = LoopbackInterfaceString::new(vec![], vec![], "\n").with_close_error();
    let mut inst = ScpiInstrument::new(interface, "GPIB0::1::INSTR");
    inst.close();
    assert!(!inst.is_open());
    assert!(inst.interface().is_closed());
}

#[rstest]
fn test_closed_instrument_rejects_io(mut emp_inst: ScpiLbk) {
    emp_inst.close();
    assert!(matches!(
        emp_inst.write("*RST"),
        Err(InstrumentError::SessionClosed)
    ));
    assert!(matches!(emp_inst.read(), Err(InstrumentError::SessionClosed)));
    assert!(matches!(
        emp_inst.query("*IDN?"),
        Err(InstrumentError::SessionClosed)
    ));
    assert!(matches!(emp_inst.idn(), Err(InstrumentError::SessionClosed)));
}

/// Dropping an open instrument closes it, even if closing fails.
#[rstest]
fn test_drop_closes() {
    let interface = LoopbackInterfaceString::new(vec![], vec![], "\n").with_close_error();
    let inst = ScpiInstrument::new(interface, "GPIB0::1::INSTR");
    drop(inst);
}
