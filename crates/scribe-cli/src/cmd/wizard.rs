use anyhow::Result;
use std::path::Path;

/// Start the setup wizard server and block until ctrl-c.
///
/// Works before `quill init`: the wizard exists to produce the project
/// config, so nothing here requires one.
pub fn run(root: &Path, port: u16, no_open: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
        let actual_port = listener.local_addr()?.port();
        println!("Scribe wizard → http://localhost:{actual_port}  (ctrl-c to stop)");

        tokio::select! {
            res = scribe_server::serve_on(root_buf, listener, !no_open) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
