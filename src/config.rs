use crate::audio::AudioConfig;
use crate::motion::BlinkConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 音频配置
    pub audio: AudioConfig,

    // 动画配置
    pub tick_hz: u32,
    pub lip_sync_expression: &'static str,

    // 眨眼配置
    pub blink: BlinkConfig,

    // UDP 桥配置
    pub command_local_port: u16,
    pub face_remote_ip: &'static str,
    pub face_remote_port: u16,
    pub bridge_buffer_size: usize,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            audio: AudioConfig {
                playback_device: env!("AUDIO_PLAYBACK_DEVICE").to_string(),
                playback_period_size: env!("AUDIO_PLAYBACK_PERIOD_SIZE").parse()
                    .map_err(|_| "Failed to parse AUDIO_PLAYBACK_PERIOD_SIZE")?,
                stream_format: env!("AUDIO_STREAM_FORMAT").to_string(),
                opus_sample_rate: env!("AUDIO_OPUS_SAMPLE_RATE").parse()
                    .map_err(|_| "Failed to parse AUDIO_OPUS_SAMPLE_RATE")?,
                opus_channels: env!("AUDIO_OPUS_CHANNELS").parse()
                    .map_err(|_| "Failed to parse AUDIO_OPUS_CHANNELS")?,
                pcm_sample_rate: env!("AUDIO_PCM_SAMPLE_RATE").parse()
                    .map_err(|_| "Failed to parse AUDIO_PCM_SAMPLE_RATE")?,
                window_size: env!("AUDIO_WINDOW_SIZE").parse()
                    .map_err(|_| "Failed to parse AUDIO_WINDOW_SIZE")?,
            },

            tick_hz: env!("ANIMATION_TICK_HZ").parse()
                .map_err(|_| "Failed to parse ANIMATION_TICK_HZ")?,
            lip_sync_expression: env!("ANIMATION_LIP_SYNC_EXPRESSION"),

            blink: BlinkConfig {
                close_duration: env!("BLINK_CLOSE_DURATION").parse()
                    .map_err(|_| "Failed to parse BLINK_CLOSE_DURATION")?,
                closed_duration: env!("BLINK_CLOSED_DURATION").parse()
                    .map_err(|_| "Failed to parse BLINK_CLOSED_DURATION")?,
                open_duration: env!("BLINK_OPEN_DURATION").parse()
                    .map_err(|_| "Failed to parse BLINK_OPEN_DURATION")?,
                hold_min: env!("BLINK_HOLD_MIN").parse()
                    .map_err(|_| "Failed to parse BLINK_HOLD_MIN")?,
                hold_jitter: env!("BLINK_HOLD_JITTER").parse()
                    .map_err(|_| "Failed to parse BLINK_HOLD_JITTER")?,
            },

            command_local_port: env!("BRIDGE_COMMAND_LOCAL_PORT").parse()
                .map_err(|_| "Failed to parse BRIDGE_COMMAND_LOCAL_PORT")?,
            face_remote_ip: env!("BRIDGE_FACE_REMOTE_IP"),
            face_remote_port: env!("BRIDGE_FACE_REMOTE_PORT").parse()
                .map_err(|_| "Failed to parse BRIDGE_FACE_REMOTE_PORT")?,
            bridge_buffer_size: env!("BRIDGE_BUFFER_SIZE").parse()
                .map_err(|_| "Failed to parse BRIDGE_BUFFER_SIZE")?,
        })
    }

    /// Seconds per animation tick.
    pub fn tick_interval_secs(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_time_config_parses() {
        let config = Config::new().unwrap();
        assert!(config.tick_hz > 0);
        assert!(config.audio.window_size > 0);
        assert!(config.blink.hold_min >= 0.0);
        assert!(config.tick_interval_secs() > 0.0);
    }
}
