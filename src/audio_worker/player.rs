use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MediaError;

/// rodio 播放状态：当前 sink、音源路径、时长与音量
pub struct PlayerState {
    mixer: Mixer,
    #[allow(dead_code)]
    stream: OutputStream,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    uri: String,
    duration: Option<Duration>,
    /// 当前 sink 起播时在曲目内的偏移（seek 会重建 sink）
    base_offset: Duration,
    paused: bool,
    volume: f32,
}

impl PlayerState {
    pub fn new(mixer: Mixer, stream: OutputStream) -> Self {
        Self {
            mixer,
            stream,
            sink: None,
            path: None,
            uri: String::new(),
            duration: None,
            base_offset: Duration::ZERO,
            paused: true,
            volume: 1.0,
        }
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = None;
        self.duration = None;
        self.base_offset = Duration::ZERO;
    }

    /// 绑定本地文件并构建 sink；返回解码得到的时长
    pub fn load(
        &mut self,
        path: &Path,
        uri: &str,
        paused: bool,
    ) -> Result<Option<Duration>, MediaError> {
        self.stop();
        let (sink, duration) = build_sink_from_path(&self.mixer, path, None, uri)?;
        sink.set_volume(self.volume);
        if paused {
            sink.pause();
        } else {
            sink.play();
        }
        self.sink = Some(sink);
        self.path = Some(path.to_path_buf());
        self.uri = uri.to_owned();
        self.duration = duration;
        self.paused = paused;
        Ok(duration)
    }

    pub fn is_loaded(&self) -> bool {
        self.path.is_some()
    }

    pub fn play(&mut self) -> Result<(), MediaError> {
        self.paused = false;
        if self.sink.as_ref().is_some_and(Sink::empty) {
            // 已播放完毕：从头重建
            self.seek(Duration::ZERO)?;
        }
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        self.paused = true;
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(volume);
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn position(&self) -> Duration {
        let pos = self
            .sink
            .as_ref()
            .map(Sink::get_pos)
            .unwrap_or_default();
        self.base_offset.saturating_add(pos)
    }

    /// sink 已存在但队列为空：曲目自然播放结束
    pub fn is_finished(&self) -> bool {
        !self.paused && self.sink.as_ref().is_some_and(Sink::empty)
    }

    pub fn seek(&mut self, position: Duration) -> Result<(), MediaError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        let (sink, _duration) =
            build_sink_from_path(&self.mixer, &path, Some(position), &self.uri)?;
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        sink.set_volume(self.volume);
        if self.paused {
            sink.pause();
        } else {
            sink.play();
        }
        self.sink = Some(sink);
        self.base_offset = position;
        Ok(())
    }
}

fn build_sink_from_path(
    mixer: &Mixer,
    path: &Path,
    seek: Option<Duration>,
    uri: &str,
) -> Result<(Sink, Option<Duration>), MediaError> {
    let file = File::open(path).map_err(|source| MediaError::OpenFile {
        uri: uri.to_owned(),
        source,
    })?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| MediaError::Decode {
        uri: uri.to_owned(),
        message: e.to_string(),
    })?;
    let duration = decoder.total_duration();
    let source: Box<dyn Source + Send> = if let Some(seek) = seek {
        Box::new(decoder.skip_duration(seek))
    } else {
        Box::new(decoder)
    };

    let sink = Sink::connect_new(mixer);
    sink.append(source);
    Ok((sink, duration))
}
