fn main() {
    env_logger::init();

    if let Err(err) = waychord::app::run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}
