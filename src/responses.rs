use atat::atat_derive::AtatResp;

/// Response of commands which are just acknowledged, e.g. by OK
#[derive(Clone, AtatResp)]
pub struct NoResponse;
