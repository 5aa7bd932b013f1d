// Errors only come out of the window side. The overlay itself never
// fails: a missing framing rect just skips the draw pass.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String),

    #[error("window update error: {0}")]
    WindowUpdate(String),
}
