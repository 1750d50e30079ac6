//! 行式控制台：从 stdin 读取命令，打印 Core 发出的事件

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::app::AppSnapshot;
use crate::domain::{Catalog, TrackId};
use crate::error::{AppError, PlaybackError};
use crate::features::player::PlaybackPhase;
use crate::messages::app::{AppCommand, AppEvent};

pub const HELP: &str = "命令: play | next | prev | select <id> | seek <0..1> | vol <0..1> | retry | quit";

/// 秒数格式化为 `m:ss`，超过一小时为 `h:mm:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// 解析一行输入；空行返回 `Ok(None)`
pub fn parse_command(line: &str) -> Result<Option<AppCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "play" | "pause" | "p" => AppCommand::PlayPause,
        "next" | "n" => AppCommand::Next,
        "prev" | "previous" => AppCommand::Prev,
        "retry" => AppCommand::Retry,
        "quit" | "q" | "exit" => AppCommand::Quit,
        "select" | "s" => {
            let id = arg
                .ok_or("用法: select <id>")?
                .parse::<i64>()
                .map_err(|e| format!("无效的曲目 id: {e}"))?;
            AppCommand::SelectTrack { id: TrackId(id) }
        }
        "seek" => {
            let fraction = arg
                .ok_or("用法: seek <0..1>")?
                .parse::<f64>()
                .map_err(|e| format!("无效的位置: {e}"))?;
            AppCommand::Seek { fraction }
        }
        "vol" | "volume" => {
            let volume = arg
                .ok_or("用法: vol <0..1>")?
                .parse::<f32>()
                .map_err(|e| format!("无效的音量: {e}"))?;
            AppCommand::SetVolume { volume }
        }
        other => return Err(format!("未知命令: {other}\n{HELP}")),
    };
    Ok(Some(cmd))
}

fn phase_label(phase: PlaybackPhase) -> &'static str {
    match phase {
        PlaybackPhase::Idle => "idle",
        PlaybackPhase::Loading => "loading",
        PlaybackPhase::Ready => "ready",
        PlaybackPhase::Playing => "playing",
        PlaybackPhase::Paused => "paused",
        PlaybackPhase::Errored => "error",
    }
}

/// 单行状态
pub fn render_state(s: &AppSnapshot) -> String {
    let track = s
        .active_track
        .as_ref()
        .map_or_else(|| "-".to_owned(), |t| format!("#{} {}", t.id, t.title));
    let mut line = format!(
        "[{}] {} {} / {} 已加载 {:.0}% 音量 {:.0}% {}",
        phase_label(s.phase),
        track,
        format_time(s.elapsed_secs()),
        format_time(s.duration),
        s.load_progress * 100.0,
        s.volume * 100.0,
        s.status,
    );
    if let Some(err) = s.visible_error() {
        line.push_str(&format!(" | {err}"));
    }
    line
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonLine<'a> {
    State { state: &'a AppSnapshot },
    Toast { message: &'a str },
    Error { error: &'a PlaybackError },
}

pub fn render_event(evt: &AppEvent, json: bool) -> Result<String, AppError> {
    if json {
        let line = match evt {
            AppEvent::State(s) => JsonLine::State { state: s },
            AppEvent::Toast(m) => JsonLine::Toast { message: m },
            AppEvent::Error(e) => JsonLine::Error { error: e },
        };
        return Ok(serde_json::to_string(&line)?);
    }
    Ok(match evt {
        AppEvent::State(s) => render_state(s),
        AppEvent::Toast(m) => format!("提示: {m}"),
        AppEvent::Error(e) => format!("错误: {e}"),
    })
}

pub fn render_catalog(catalog: &Catalog) -> String {
    catalog
        .tracks()
        .iter()
        .map(|t| {
            let mut line = format!("{:>3}  {}  {}", t.id, t.title, t.primary_uri);
            if !t.alternate_uris.is_empty() {
                line.push_str(&format!("  (备用: {})", t.alternate_uris.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 运行控制台，直到 Core 退出
pub async fn run_console(
    tx: mpsc::Sender<AppCommand>,
    mut rx: mpsc::Receiver<AppEvent>,
    json: bool,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last_state: Option<String> = None;

    if !json {
        println!("{HELP}");
    }

    loop {
        tokio::select! {
            maybe_evt = rx.recv() => {
                let Some(evt) = maybe_evt else {
                    break;
                };
                let out = render_event(&evt, json)?;
                // 进度事件很频繁，文本模式下只打印变化的状态行
                if !json && matches!(evt, AppEvent::State(_)) {
                    if last_state.as_deref() == Some(out.as_str()) {
                        continue;
                    }
                    last_state = Some(out.clone());
                }
                println!("{out}");
            }
            line = lines.next_line(), if stdin_open => {
                let cmd = match line? {
                    Some(line) => match parse_command(&line) {
                        Ok(Some(cmd)) => cmd,
                        Ok(None) => continue,
                        Err(msg) => {
                            eprintln!("{msg}");
                            continue;
                        }
                    },
                    None => {
                        stdin_open = false;
                        AppCommand::Quit
                    }
                };
                tracing::debug!(command = ?cmd, "控制台命令");
                if tx.send(cmd).await.is_err() {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effects::CoreEffects;
    use crate::core::infra::PreloadManager;
    use crate::domain::Track;
    use crate::features::player::PlaybackSession;

    #[test]
    fn format_time_matches_clock_display() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  "), Ok(None));
        assert_eq!(parse_command("play"), Ok(Some(AppCommand::PlayPause)));
        assert_eq!(parse_command("NEXT"), Ok(Some(AppCommand::Next)));
        assert_eq!(parse_command("prev"), Ok(Some(AppCommand::Prev)));
        assert_eq!(
            parse_command("select 3"),
            Ok(Some(AppCommand::SelectTrack { id: TrackId(3) }))
        );
        assert_eq!(
            parse_command("seek 0.5"),
            Ok(Some(AppCommand::Seek { fraction: 0.5 }))
        );
        assert_eq!(
            parse_command("vol 0.25"),
            Ok(Some(AppCommand::SetVolume { volume: 0.25 }))
        );
        assert_eq!(parse_command("retry"), Ok(Some(AppCommand::Retry)));
        assert_eq!(parse_command("quit"), Ok(Some(AppCommand::Quit)));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("select").is_err());
        assert!(parse_command("select abc").is_err());
        assert!(parse_command("seek x").is_err());
        assert!(parse_command("dance").is_err());
    }

    fn snapshot() -> AppSnapshot {
        let track = Track::new(2, "Jehovah", "/audio/jehovah.mp3");
        let mut session = PlaybackSession::default();
        session.select_track(&track, &mut CoreEffects::default());
        session.on_duration_known(200.0);
        session.on_ready();
        session.on_progress(0.5, 1.0);
        AppSnapshot::from_parts(&session, &PreloadManager::default())
    }

    #[test]
    fn renders_text_state() {
        let line = render_state(&snapshot());
        assert!(line.starts_with("[playing] #2 Jehovah"));
        assert!(line.contains("1:40 / 3:20"));
    }

    #[test]
    fn renders_json_lines() {
        let evt = AppEvent::State(Box::new(snapshot()));
        let out = render_event(&evt, true).expect("json");
        let v: serde_json::Value = serde_json::from_str(&out).expect("parse");
        assert_eq!(v["type"], "state");
        assert_eq!(v["state"]["phase"], "playing");

        let out = render_event(&AppEvent::Error(PlaybackError::ControlsLocked), true).expect("json");
        let v: serde_json::Value = serde_json::from_str(&out).expect("parse");
        assert_eq!(v["type"], "error");
        assert_eq!(v["error"]["kind"], "controls_locked");
    }

    #[test]
    fn renders_catalog_listing() {
        let out = render_catalog(&Catalog::builtin());
        assert_eq!(out.lines().count(), 5);
        assert!(out.contains("/audio/habibi.ogg"));
    }
}
