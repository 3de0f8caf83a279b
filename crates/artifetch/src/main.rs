use miette::IntoDiagnostic;

pub fn main() -> miette::Result<()> {
    // The main thread has a platform dependent stack size (1MB on windows).
    // Run everything on a `main2` thread of known size instead, respecting
    // RUST_MIN_STACK if it asks for more.
    let main_stack_size = std::env::var("RUST_MIN_STACK")
        .ok()
        .and_then(|var| var.parse::<usize>().ok())
        .unwrap_or(0)
        .max(4 * 1024 * 1024);

    let main2 = move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .into_diagnostic()?;

        runtime.block_on(Box::pin(artifetch_cli::execute()))
    };

    std::thread::Builder::new()
        .name("main2".to_string())
        .stack_size(main_stack_size)
        .spawn(main2)
        .into_diagnostic()?
        .join()
        .map_err(|_| miette::miette!("the main thread panicked"))?
}
