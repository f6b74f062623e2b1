// Runs the built-in sample suite.
// Usage: subcase run [--filter TEXT] [--format console|json] [--order file|name|random]

fn main() {
    subcase::cli::run();
}
