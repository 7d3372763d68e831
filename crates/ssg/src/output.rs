//! Human-facing progress output.

pub use anstream::{eprintln as aeprintln, println as aprintln};

/// Tokyo Night color palette
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const TKN_RED: &str = "\x1b[38;2;247;118;142m"; // #f7768e
    pub const TKN_GREEN: &str = "\x1b[38;2;158;206;106m"; // #9ece6a
    pub const TKN_YELLOW: &str = "\x1b[38;2;224;175;104m"; // #e0af68
    pub const TKN_BLUE: &str = "\x1b[38;2;122;162;247m"; // #7aa2f7
    pub const TKN_CYAN: &str = "\x1b[38;2;125;207;255m"; // #7dcfff
    pub const TKN_GRAY: &str = "\x1b[38;2;86;95;137m"; // #565f89
}

fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}{}", colors::RESET)
}

pub fn p_g(text: &str) -> String {
    paint(colors::TKN_GREEN, text)
}

pub fn p_r(text: &str) -> String {
    paint(colors::TKN_RED, text)
}

pub fn p_y(text: &str) -> String {
    paint(colors::TKN_YELLOW, text)
}

pub fn p_b(text: &str) -> String {
    paint(colors::TKN_BLUE, text)
}

pub fn p_c(text: &str) -> String {
    paint(colors::TKN_CYAN, text)
}

pub fn p_gray(text: &str) -> String {
    paint(colors::TKN_GRAY, text)
}

pub fn p_dim(text: &str) -> String {
    paint(colors::DIM, text)
}

pub fn p_bold(text: &str) -> String {
    paint(colors::BOLD, text)
}

/// `[vite-ssg]` prefix.
pub fn tag() -> String {
    p_gray("[vite-ssg]")
}

/// Section header for one build step.
pub fn build_log(text: &str) {
    aprintln!("\n{} {}", tag(), p_y(text));
}

/// `dist/index.html        1.23 KiB`
pub fn page_written(out_dir: &str, filename: &str, size: &str) {
    aprintln!(
        "{}{}  {}",
        p_dim(&format!("{out_dir}/")),
        p_c(&format!("{filename:<15}")),
        p_dim(size)
    );
}

/// CLI failure report: the message, then the generic notice.
pub fn report_failure(message: &str) {
    aeprintln!("\n{} {}", tag(), p_bold(&p_g(message)));
    aeprintln!("\n{} {}", tag(), p_bold(&p_r("An internal error occurred.")));
}

/// Size of `content` in KiB with two decimals.
pub fn format_size(content: &str) -> String {
    format!("{:.2} KiB", content.len() as f64 / 1024.0)
}
