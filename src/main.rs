use cfgslice::cli;

fn main() {
    cli::run();
}
