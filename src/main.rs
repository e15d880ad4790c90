fn main() {
    if let Err(err) = wgpu_batch::run() {
        eprintln!("Application error: {err}");
    }
}
