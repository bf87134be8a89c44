//! Status output. Everything here goes to stderr so stdout carries only the
//! payload and can be piped.

pub fn print_success(message: &str) {
    eprintln!("[SUCCESS] {message}");
}

pub fn print_warning(message: &str) {
    eprintln!("[WARNING] {message}");
}

pub fn print_info(message: &str) {
    eprintln!("[INFO] {message}");
}
