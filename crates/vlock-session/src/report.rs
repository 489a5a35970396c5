//! Messages printed around authentication.

/// Printed after an authentication backend error, which may mean no
/// password can ever succeed.
pub const AUTH_FAILURE_BLURB: &str = "\n\
******************************************************************\n\
*** You may not be able to able to unlock your terminal now.   ***\n\
***                                                            ***\n\
*** Log into another terminal and kill the vlock-main process. ***\n\
******************************************************************\n\
\n";

/// Summary of failed tries, or `None` when there were none.
pub fn tries_message(tries: u32) -> Option<String> {
    match tries {
        0 => None,
        1 => Some("1 failed authentication try.".to_string()),
        n => Some(format!("{n} failed authentication tries.")),
    }
}
