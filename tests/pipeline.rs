#![cfg(unix)]

mod common;

use common::{FakeTools, Whisper};
use mediaflow::config::RetentionPolicy;
use mediaflow::error::MediaflowError;
use mediaflow::workflow::Workflow;

#[tokio::test]
async fn full_pipeline_produces_chained_artifacts() {
    let tools = FakeTools::new(Whisper::Works);
    let input = tools.place_video("1700000000000-clip.mp4");
    let workflow = Workflow::new(&tools.config());

    let output = workflow.process(&input).await.unwrap();

    assert_eq!(
        output.final_path,
        tools.uploads.join("1700000000000-clip-audio-enhanced-brightness-subtitled-denoised.mp4")
    );
    assert_eq!(
        tools.upload_names(),
        vec![
            "1700000000000-clip-audio-enhanced-brightness-subtitled-denoised.mp4",
            "1700000000000-clip-audio-enhanced-brightness-subtitled.mp4",
            "1700000000000-clip-audio-enhanced-brightness.mp4",
            "1700000000000-clip-audio-enhanced-brightness.srt",
            "1700000000000-clip-audio-enhanced.mp4",
            "1700000000000-clip.mp4",
        ]
    );
    assert_eq!(
        tools.invocations(),
        vec!["ffmpeg", "ffmpeg", "whisper", "ffmpeg", "ffmpeg"]
    );
}

#[tokio::test]
async fn commands_carry_fixed_filters_in_order() {
    let tools = FakeTools::new(Whisper::Works);
    let input = tools.place_video("clip.mp4");
    Workflow::new(&tools.config()).process(&input).await.unwrap();

    let lines = tools.invocation_lines();
    assert!(lines[0].contains("-af loudnorm -c:v copy"));
    assert!(lines[1].contains("-vf eq=brightness=0.06:contrast=1.2"));
    assert!(lines[2].contains("--model small --language English --output_format srt"));
    assert!(lines[3].contains("subtitles="));
    assert!(lines[4].contains("highpass=f=200, lowpass=f=3000"));
}

#[tokio::test]
async fn existing_stage_output_is_left_untouched() {
    let tools = FakeTools::new(Whisper::Works);
    let input = tools.place_video("1000-clip.mp4");
    let other = tools.uploads.join("1000-clip-audio-enhanced.mp4");
    std::fs::write(&other, b"OTHER USER UPLOAD").unwrap();

    let err = Workflow::new(&tools.config()).process(&input).await.unwrap_err();

    match &err {
        MediaflowError::ExternalTool { stage, exit, .. } => {
            assert_eq!(stage, "audio");
            assert!(exit.contains("already exists"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(std::fs::read(&other).unwrap(), b"OTHER USER UPLOAD");
    assert_eq!(tools.invocations(), vec!["ffmpeg"]);
}

#[tokio::test]
async fn transcriber_failure_stops_before_burn_in() {
    let tools = FakeTools::new(Whisper::Fails);
    let input = tools.place_video("clip.mp4");

    let err = Workflow::new(&tools.config()).process(&input).await.unwrap_err();

    match &err {
        MediaflowError::ExternalTool { stage, exit, .. } => {
            assert_eq!(stage, "subtitle");
            assert!(exit.contains("code 2"));
            assert!(exit.contains("model failed to load"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(tools.invocations(), vec!["ffmpeg", "ffmpeg", "whisper"]);
    assert!(tools
        .upload_names()
        .iter()
        .all(|name| !name.contains("-subtitled") && !name.contains("-denoised")));
}

#[tokio::test]
async fn silent_transcriber_is_missing_artifact() {
    let tools = FakeTools::new(Whisper::Silent);
    let input = tools.place_video("clip.mp4");

    let err = Workflow::new(&tools.config()).process(&input).await.unwrap_err();

    assert!(matches!(
        err,
        MediaflowError::MissingArtifact { ref stage, ref path }
            if stage == "subtitle" && path.ends_with("clip-audio-enhanced-brightness.srt")
    ));
    // burn-in never ran
    assert_eq!(tools.invocations(), vec!["ffmpeg", "ffmpeg", "whisper"]);
}

#[tokio::test]
async fn final_only_retention_leaves_input_and_result() {
    let tools = FakeTools::new(Whisper::Works);
    let input = tools.place_video("clip.mp4");
    let mut config = tools.config();
    config.pipeline.retention = RetentionPolicy::FinalOnly;

    Workflow::new(&config).process(&input).await.unwrap();

    assert_eq!(
        tools.upload_names(),
        vec!["clip-audio-enhanced-brightness-subtitled-denoised.mp4", "clip.mp4"]
    );
}

#[tokio::test]
async fn availability_check_uses_configured_tools() {
    let tools = FakeTools::new(Whisper::Works);
    Workflow::new(&tools.config()).check_availability().await.unwrap();
    assert_eq!(tools.invocation_lines(), vec!["ffmpeg -version", "whisper --help"]);

    let mut config = tools.config();
    let missing = tools.root.path().join("missing-ffmpeg");
    config.media.binary_path = missing.to_string_lossy().into_owned();
    let err = Workflow::new(&config).check_availability().await.unwrap_err();
    assert!(matches!(err, MediaflowError::Spawn { .. }));
}
