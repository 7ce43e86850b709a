fn main() -> anyhow::Result<()> {
    unitex::cli::run_cli()
}
