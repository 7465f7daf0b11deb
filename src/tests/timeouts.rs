use crate::framer::Error;
use crate::mirror::NoDebug;
use crate::reset::NoResetPin;
use crate::tests::mock::{ClockTimer, MockSerial};
use crate::timeouts::Timeouts;
use crate::wifi::Adapter;

type AdapterType = Adapter<'static, MockSerial, ClockTimer, NoResetPin, NoDebug, 1_000>;

#[test]
fn test_defaults() {
    let timeouts = Timeouts::default();

    assert_eq!(1_000, timeouts.receive);
    assert_eq!(5_000, timeouts.reset);
    assert_eq!(15_000, timeouts.connect);
    assert_eq!(120_000, timeouts.chunked);
}

#[test]
fn test_update_zero_keeps_value() {
    let mut timeouts = Timeouts::default();
    timeouts.update(0, 2_000, 0, 60_000);

    assert_eq!(1_000, timeouts.receive);
    assert_eq!(2_000, timeouts.reset);
    assert_eq!(15_000, timeouts.connect);
    assert_eq!(60_000, timeouts.chunked);
}

#[test]
fn test_adapter_receive_timeout_applied() {
    let mut adapter: AdapterType = Adapter::new(MockSerial::new(), ClockTimer::new());
    adapter.set_timeouts(250, 0, 0, 0);

    assert_eq!(250, adapter.timeouts().receive);
    assert_eq!(Error::Timeout, adapter.find(None, false).unwrap_err());
    assert_eq!(250, adapter.link.timer.elapsed());
}

#[test]
fn test_adapter_zero_receive_timeout_ignored() {
    let mut adapter: AdapterType = Adapter::new(MockSerial::new(), ClockTimer::new());
    adapter.set_timeouts(0, 0, 3_000, 0);

    assert_eq!(3_000, adapter.timeouts().connect);
    assert_eq!(Error::Timeout, adapter.find(None, false).unwrap_err());
    assert_eq!(1_000, adapter.link.timer.elapsed());
}
