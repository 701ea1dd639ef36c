use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt };

use super::controller::ChatController;

const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Line-based front-end: each input line is one submit, replies are printed as
/// they arrive. Ends on EOF or `/quit`.
pub async fn run_terminal<R, W>(
    controller: &mut ChatController,
    persona_name: &str,
    input: R,
    mut output: W
) -> std::io::Result<()>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let mut lines = input.lines();

    output.write_all(format!("和{}聊天吧（输入 /quit 退出）\n", persona_name).as_bytes()).await?;
    output.flush().await?;

    while let Some(line) = lines.next_line().await? {
        if QUIT_COMMANDS.contains(&line.trim()) {
            break;
        }

        controller.set_input(line);
        let Some(reply) = controller.submit().await else {
            continue;
        };
        let rendered = format!("{}: {}\n", persona_name, reply.content);
        output.write_all(rendered.as_bytes()).await?;

        if let Some(notice) = controller.error() {
            output.write_all(format!("[!] {}\n", notice).as_bytes()).await?;
        }
        output.flush().await?;
    }

    Ok(())
}
