fn main() {
    if let Err(err) = sheet_sense::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
