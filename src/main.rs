fn main() {
    slashes::cli::run();
}
