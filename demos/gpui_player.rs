use gpui::{App, Application, WindowOptions, prelude::*};
use gpui_video_widget::{
    Configuration, PointerScope, Video, VideoPlayerEvent, VideoPlayerView, VideoWidget,
};
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let source = std::env::args().nth(1).unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("assets/test.mp4")
            .display()
            .to_string()
    });

    Application::new().run(move |cx: &mut App| {
        let video = Video::new().expect("failed to create video");
        let scope = PointerScope::new();
        let widget = VideoWidget::new(video, scope.clone());
        widget.apply_configuration(&Configuration::new(source.clone()).autoplay(true));

        cx.open_window(
            WindowOptions {
                focus: true,
                ..Default::default()
            },
            |_, cx| {
                let view = cx.new(|cx| VideoPlayerView::new(widget, scope, cx));
                cx.subscribe(&view, |_, event: &VideoPlayerEvent, _| match event {
                    VideoPlayerEvent::TimeUpdate(update) => {
                        log::trace!("time update {}s", update.current_time_seconds)
                    }
                    VideoPlayerEvent::Ended => log::info!("playback ended"),
                    VideoPlayerEvent::Error(code) => log::warn!("playback error: {code}"),
                })
                .detach();
                view
            },
        )
        .unwrap();
        cx.activate(true);
    });
}
