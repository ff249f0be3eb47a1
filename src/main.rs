use envbake::cli::BakeCli;

fn main() {
    let cli = match BakeCli::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = envbake::run(cli) {
        eprintln!("Bake error: {err:?}");
        std::process::exit(1);
    }
}
