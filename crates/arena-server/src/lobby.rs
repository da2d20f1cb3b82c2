//! Demo lobby
//!
//! Consumes the admission queue: greets every admitted player, echoes
//! nothing, and lets them leave with `q`, Ctrl-C or Ctrl-D. Departure
//! closes the channel and gives the player's name and identity back.

use std::sync::Arc;

use russh::ChannelMsg;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::session::AdmittedSession;
use crate::state::ServerState;

const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;

/// Take admitted sessions off the queue until cancelled or every sender is
/// gone, playing each on its own task.
pub async fn run_lobby(
    state: Arc<ServerState>,
    mut admissions: mpsc::Receiver<AdmittedSession>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lobby shutting down");
                break;
            }
            admitted = admissions.recv() => {
                let Some(session) = admitted else { break };
                tokio::spawn(play(Arc::clone(&state), session));
            }
        }
    }
}

/// Serve one player until they leave
async fn play(state: Arc<ServerState>, mut session: AdmittedSession) {
    let player = Arc::clone(&session.player);
    tracing::info!("[{}] joined the lobby", player.name);

    let name = player.name.clone();
    let mut resizes = std::mem::replace(&mut session.resizes, mpsc::channel(1).1);
    let watcher = tokio::spawn(async move {
        while let Some(size) = resizes.recv().await {
            tracing::debug!("[{}] terminal is now {}", name, size);
        }
    });

    if session.shell_started().await {
        let text = greeting(&player.name, state.players.len(), &state.addresses);
        if let Err(e) = session.channel.data(text.as_bytes()).await {
            tracing::debug!("[{}] greeting not delivered: {}", player.name, e);
        }

        while let Some(msg) = session.channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } if wants_to_leave(data) => break,
                ChannelMsg::Eof | ChannelMsg::Close => break,
                _ => {}
            }
        }
    }

    watcher.abort();
    let _ = session.channel.close().await;
    state.players.remove(&player);
    state.identities.release(player.id);
    tracing::info!("[{}] left the lobby", player.name);
}

/// Whether a chunk of input asks to quit
fn wants_to_leave(input: &[u8]) -> bool {
    input.iter().any(|b| matches!(*b, b'q' | CTRL_C | CTRL_D))
}

/// Welcome text shown once the shell has started
pub fn greeting(name: &str, online: usize, addresses: &str) -> String {
    let mut text = format!("Welcome, {}!\r\n", name);
    let others = online.saturating_sub(1);
    match others {
        0 => text.push_str("You are the only one here.\r\n"),
        1 => text.push_str("1 other player is online.\r\n"),
        n => text.push_str(&format!("{} other players are online.\r\n", n)),
    }
    if !addresses.is_empty() {
        text.push_str("Invite friends with:\r\n");
        for line in addresses.lines() {
            text.push_str(line);
            text.push_str("\r\n");
        }
    }
    text.push_str("Press q to leave.\r\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_alone() {
        let text = greeting("Bob", 1, "");
        assert!(text.starts_with("Welcome, Bob!\r\n"));
        assert!(text.contains("only one here"));
        assert!(!text.contains("Invite"));
    }

    #[test]
    fn test_greeting_lists_addresses() {
        let text = greeting("player-3", 4, " ssh 10.0.0.2 -p 2200\n ssh 192.168.1.4 -p 2200");
        assert!(text.contains("3 other players are online."));
        assert!(text.contains(" ssh 10.0.0.2 -p 2200\r\n"));
        assert!(text.contains(" ssh 192.168.1.4 -p 2200\r\n"));
    }

    #[test]
    fn test_quit_keys() {
        assert!(wants_to_leave(b"q"));
        assert!(wants_to_leave(&[CTRL_C]));
        assert!(wants_to_leave(b"ab\x04"));
        assert!(!wants_to_leave(b"hello"));
    }
}
