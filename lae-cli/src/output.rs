// Terminal output for lae commands
// Everything goes to stderr so stdout can carry the result document

use std::time::Duration;

use lae_engine::OperatorKind;

fn paint(style: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", style, text)
}

/// Right-aligned action label followed by a message
pub fn status(action: &str, message: &str) {
    eprintln!("{} {}", paint("1;36", &format!("{:>10}", action)), message);
}

pub fn success(message: &str) {
    eprintln!("{} {}", paint("1;32", "ok"), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", paint("1;31", "failed"), message);
}

/// One passed validation check
pub fn check(message: &str) {
    eprintln!("  {} {}", paint("32", "+"), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", paint("1;31", "error:"), message);
}

pub fn info(message: &str) {
    eprintln!("  {} {}", paint("36", "-"), message);
}

pub fn dim(message: &str) {
    eprintln!("{}", paint("2", message));
}

pub fn header(message: &str) {
    eprintln!("{}", paint("1", &format!("== {}", message)));
}

/// `[step 2] multiply (*) over 3 rows`
pub fn step_started(step: usize, kind: OperatorKind, tasks: usize) {
    eprintln!(
        "  {} {} ({}) over {} rows",
        paint("1;34", &format!("[step {}]", step)),
        kind.name(),
        kind.symbol(),
        tasks
    );
}

pub fn step_completed(rows: usize, columns: usize, duration: Duration) {
    eprintln!(
        "{}",
        paint(
            "32",
            &format!(
                "           -> {}x{} in {:.2}ms",
                rows,
                columns,
                duration.as_secs_f64() * 1000.0
            )
        )
    );
}
