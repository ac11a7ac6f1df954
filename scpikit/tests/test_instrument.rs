//! Tests for the byte-stream [`Instrument`] session.
//!
//! A [`VecDeque<u8>`] serves as the port: Writes are appended to the back, reads are taken from
//! the front.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use scpikit::{Instrument, InstrumentError, InstrumentInterface};

/// Set up a empty instrument with default 3 second timeout.
#[fixture]
fn empt_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(VecDeque::new(), Duration::from_secs(3))
}

/// Set up a instrument with no terminator and no timeout duration.
#[fixture]
fn no_term_inst() -> Instrument<VecDeque<u8>> {
    Instrument::new(
        VecDeque::from(vec![b'r', b'e', b's', b'p']),
        Duration::from_secs(0),
    )
}

/// Create an instrument whose port already holds the given response bytes.
fn resp_inst(resp: &str) -> Instrument<VecDeque<u8>> {
    Instrument::new(
        resp.as_bytes().iter().copied().collect(),
        Duration::from_secs(3),
    )
}

#[rstest]
fn test_instrument_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_terminator(), "\n");

    empt_inst.set_terminator("\r\n");
    assert_eq!(empt_inst.get_terminator(), "\r\n");
}

#[rstest]
fn test_instrument_timeout(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert_eq!(empt_inst.get_timeout(), Duration::from_secs(3));

    empt_inst.set_timeout(Duration::from_millis(5000)).unwrap();
    assert_eq!(empt_inst.get_timeout(), Duration::from_millis(5000));
}

#[rstest]
fn test_instrument_write_read(mut empt_inst: Instrument<VecDeque<u8>>) {
    let data = b"Hello, Instrument!";
    empt_inst.write_raw(data).unwrap();

    let mut buf = vec![0; data.len()];
    empt_inst.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, data);
}

#[rstest]
fn test_instrument_sendcmd_appends_terminator(mut empt_inst: Instrument<VecDeque<u8>>) {
    empt_inst.set_terminator("\r\n");
    empt_inst.sendcmd("*RST").unwrap();
    assert_eq!(empt_inst.get_ref(), &VecDeque::from(b"*RST\r\n".to_vec()));
}

/// Reading removes the terminator, but leaves all other whitespace alone.
#[rstest]
fn test_instrument_read_until_terminator() {
    let mut inst = resp_inst(" +1.234E+00 \nnext\n");
    assert_eq!(inst.read_until_terminator().unwrap(), " +1.234E+00 ");
    assert_eq!(inst.read_until_terminator().unwrap(), "next");
}

#[rstest]
fn test_instrument_read_until_multichar_terminator() {
    let mut inst = resp_inst("a\nb\r\n");
    inst.set_terminator("\r\n");
    assert_eq!(inst.read_until_terminator().unwrap(), "a\nb");
}

/// Invalid UTF-8 bytes are replaced, the rest of the response is kept.
#[rstest]
fn test_instrument_read_replaces_invalid_utf8() {
    let mut inst = Instrument::new(
        VecDeque::from(vec![b'o', 0xff, b'k', b'\n']),
        Duration::from_secs(3),
    );
    assert_eq!(inst.read_until_terminator().unwrap(), "o\u{fffd}k");
}

/// Multi-byte characters, e.g., units, arrive intact.
#[rstest]
#[case("23.5 °C")]
#[case("1.2 µA")]
#[case("470 Ω")]
fn test_instrument_read_multibyte_utf8(#[case] resp: &str) {
    let data = format!("{resp}\n").into_bytes();
    let mut inst = Instrument::new(VecDeque::from(data), Duration::from_secs(3));
    assert_eq!(inst.read_until_terminator().unwrap(), resp);
}

/// A multi-byte terminator is only matched as a whole.
#[rstest]
fn test_instrument_read_multibyte_terminator() {
    let mut inst = Instrument::new(
        VecDeque::from("25 °C¶rest".as_bytes().to_vec()),
        Duration::from_secs(3),
    );
    inst.set_terminator("¶");
    assert_eq!(inst.read_until_terminator().unwrap(), "25 °C");
}

/// Running out of data is an I/O error, not a timeout.
#[rstest]
fn test_instrument_read_eof(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert!(matches!(
        empt_inst.read_until_terminator(),
        Err(InstrumentError::Io(_))
    ));
}

#[rstest]
fn test_instrument_read_until_terminator_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_term_inst.read_until_terminator() {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_instrument_query_timeout(mut no_term_inst: Instrument<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);
    let query_exp = "QUERY";

    match no_term_inst.query(query_exp) {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query_exp, query);
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_instrument_query_trims() {
    let mut inst = resp_inst("  +1.234E+00\t\n");
    assert_eq!(inst.query(":MEAS:VOLT?").unwrap(), "+1.234E+00");
    // The query itself ended up at the back of the port.
    assert_eq!(inst.get_ref(), &VecDeque::from(b":MEAS:VOLT?\n".to_vec()));
}

#[rstest]
fn test_instrument_close(mut empt_inst: Instrument<VecDeque<u8>>) {
    assert!(empt_inst.close().is_ok());
}
