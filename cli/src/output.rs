use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn subheader(title: &str) {
    println!("{}", title.bold());
}

pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn info(msg: &str) {
    eprintln!("{} {}", "info:".blue().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// `  key = value` line under a subheader.
pub fn property(key: &str, value: &str) {
    println!("  {} = {}", key.cyan(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_does_not_panic() {
        header("Test Header");
    }

    #[test]
    fn test_subheader_does_not_panic() {
        subheader("Test Subheader");
    }

    #[test]
    fn test_hint_does_not_panic() {
        hint("This is a hint");
    }

    #[test]
    fn test_info_does_not_panic() {
        info("This is info");
    }

    #[test]
    fn test_success_does_not_panic() {
        success("This is success");
    }

    #[test]
    fn test_property_does_not_panic() {
        property("testProperty1", "testValue1");
    }
}
