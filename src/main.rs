//! Binary entrypoint that launches the study assistant chat client.

use std::process::ExitCode;

use studybot_client::start_studybot;

/// Start the terminal chat client.
fn main() -> ExitCode {
    start_studybot::run()
}
