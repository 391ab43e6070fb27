// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
 _            _                       _
| | ___  ___ | |_  ___  ___   __ _  | |__
| |/ _ \/ _ \| __|/ __|/ _ \ / _` | | '_ \
| |  __/  __/| |_| (__| (_) | (_| | | | | |
|_|\___|\___| \__|\___|\___/ \__,_| |_| |_|

    Problem analysis from your local model
"#;
    println!("{}", banner);
}
