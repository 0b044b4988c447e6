fn main() {
    if let Err(err) = table_profiler::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
