use crate::framer::Error as FramerError;
use crate::mirror::NoDebug;
use crate::reset::NoResetPin;
use crate::smtp::{Error, MailSession};
use crate::tests::mock::{ClockTimer, MockSerial};
use crate::wifi::Adapter;

type AdapterType = Adapter<'static, MockSerial, ClockTimer, NoResetPin, NoDebug, 1_000>;

fn adapter_with_responses(responses: &[&[u8]]) -> AdapterType {
    let mut serial = MockSerial::new();
    for response in responses {
        serial.add_response(response);
    }

    Adapter::new(serial, ClockTimer::new())
}

#[test]
fn test_hello() {
    let mut adapter = adapter_with_responses(&[
        b"\r\nOK\r\n> ",
        b"\r\nSEND OK\r\n\r\n+IPD,22:250 mail.example.com\r\n",
    ]);

    MailSession::new(&mut adapter).hello("device.local").unwrap();
    assert_eq!(
        "AT+CIPSEND=19\r\nHELO device.local\r\n",
        adapter.link.transport.written_as_string()
    );
}

#[test]
fn test_send_command_default_ack() {
    let mut adapter = adapter_with_responses(&[b"> ", b"\r\nSEND OK\r\n"]);

    MailSession::new(&mut adapter).send_command(b"Subject: Test", None).unwrap();
    assert_eq!(
        "AT+CIPSEND=15\r\nSubject: Test\r\n",
        adapter.link.transport.written_as_string()
    );
}

#[test]
fn test_envelope() {
    let mut adapter = adapter_with_responses(&[
        b"> ",
        b"SEND OK\r\n+IPD,8:250 ok\r\n",
        b"> ",
        b"SEND OK\r\n+IPD,8:250 ok\r\n",
        b"> ",
        b"SEND OK\r\n+IPD,14:354 go ahead\r\n",
        b"> ",
        b"SEND OK\r\n+IPD,8:250 ok\r\n",
        b"> ",
        b"SEND OK\r\n+IPD,9:221 bye\r\n",
    ]);

    let mut mail = MailSession::new(&mut adapter);
    mail.mail_from("device@example.com").unwrap();
    mail.recipient("admin@example.com").unwrap();
    mail.data().unwrap();
    mail.end_data().unwrap();
    mail.quit().unwrap();

    assert_eq!(
        "AT+CIPSEND=32\r\nMAIL FROM:<device@example.com>\r\n\
         AT+CIPSEND=29\r\nRCPT TO:<admin@example.com>\r\n\
         AT+CIPSEND=6\r\nDATA\r\n\
         AT+CIPSEND=3\r\n.\r\n\
         AT+CIPSEND=6\r\nQUIT\r\n",
        adapter.link.transport.written_as_string()
    );
}

#[test]
fn test_transmission_not_prompted() {
    let mut adapter = adapter_with_responses(&[b"\r\nERROR\r\n"]);

    let error = MailSession::new(&mut adapter).hello("device.local").unwrap_err();
    assert_eq!(Error::TransmissionStartFailed(FramerError::Timeout), error);
    assert_eq!("AT+CIPSEND=19\r\n", adapter.link.transport.written_as_string());
}

#[test]
fn test_reply_code_missing() {
    let mut adapter = adapter_with_responses(&[b"> ", b"SEND OK\r\n+IPD,25:550 mailbox unavailable\r\n"]);

    let error = MailSession::new(&mut adapter).recipient("nobody@example.com").unwrap_err();
    assert_eq!(Error::CommandFailed(FramerError::Timeout), error);
}

#[test]
fn test_line_too_long() {
    let mut adapter = adapter_with_responses(&[]);
    let line = [b'x'; 257];

    let error = MailSession::new(&mut adapter).send_command(&line, None).unwrap_err();
    assert_eq!(Error::LineTooLong, error);
    assert!(adapter.link.transport.written.is_empty());
}
