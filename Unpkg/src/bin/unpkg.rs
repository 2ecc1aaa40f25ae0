fn main() -> anyhow::Result<()> {
    unpkg::cli::run_cli()
}
