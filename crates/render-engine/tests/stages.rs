mod support;

use support::{cleanup, fixture_source, test_config, FakeToolchain, RENDERER};
use wfgen_artifact_model::artifact::{Artifact, ArtifactKind, ArtifactSet};
use wfgen_artifact_model::frames::frame_file_name;
use wfgen_artifact_model::reveal::{RevealScript, RevealStep};
use wfgen_artifact_model::source::DiagramSource;
use wfgen_common::error::WfgenError;
use wfgen_render_engine::loop_encode::PALETTE_FILE;
use wfgen_render_engine::scratch::ScratchDir;
use wfgen_render_engine::{
    build_frames, encode_loop, encode_video, package, render_raster, render_vector, LoopInput,
    StageContext,
};
use wfgen_toolchain::capability::CapabilitySet;

const ALL_TOOLS: CapabilitySet = CapabilitySet {
    renderer_available: true,
    encoder_available: Some(true),
};

fn source() -> DiagramSource {
    DiagramSource::load(fixture_source()).unwrap()
}

#[tokio::test]
async fn static_renders_produce_non_empty_files() {
    let config = test_config("static_renders");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);

    let png = render_raster(&ctx, &source()).await.unwrap();
    let svg = render_vector(&ctx, &source(), &RevealScript::default_workflow())
        .await
        .unwrap();

    assert!(png.exists() && png.size_bytes() > 0);
    assert!(svg.exists() && svg.size_bytes() > 0);
    assert_eq!(png.path(), config.output_path("workflow.png"));

    let raster_call = &runner.calls()[0];
    assert_eq!(raster_call.program, RENDERER);
    assert_eq!(raster_call.value_of("-b").unwrap(), "transparent");
    assert_eq!(raster_call.value_of("-t").unwrap(), "neutral");

    cleanup(&config);
}

#[tokio::test]
async fn stale_output_does_not_mask_a_silent_renderer() {
    let config = test_config("stale_output");
    std::fs::create_dir_all(&config.output_dir).unwrap();
    std::fs::write(config.output_path("workflow.png"), b"from last week").unwrap();
    let runner = FakeToolchain::all_tools().silent_on("workflow.png");
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);

    let err = render_raster(&ctx, &source()).await.unwrap_err();
    assert!(matches!(err, WfgenError::StageProduction { .. }));

    cleanup(&config);
}

#[tokio::test]
async fn frame_sequence_has_k_plus_ten_contiguous_frames() {
    let config = test_config("frame_count");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();
    let script = RevealScript::default_workflow();

    let frames = build_frames(&ctx, &source(), &script, scratch.path())
        .await
        .unwrap();

    let k = script.len();
    assert_eq!(frames.len(), k + 10);
    assert_eq!(frames.scripted_len(), k);
    for (i, frame) in frames.frames().iter().enumerate() {
        assert_eq!(*frame, config.frames_dir().join(frame_file_name(i)));
        assert!(frame.is_file());
    }

    let last_scripted = std::fs::read(&frames.frames()[k - 1]).unwrap();
    let before_last = std::fs::read(&frames.frames()[k - 2]).unwrap();
    assert_ne!(before_last, last_scripted);
    for pause in &frames.frames()[k..] {
        assert_eq!(std::fs::read(pause).unwrap(), last_scripted);
    }

    // Pause frames are copies, not renders.
    assert_eq!(runner.calls().len(), k);

    scratch.remove().unwrap();
    cleanup(&config);
}

#[tokio::test]
async fn short_script_still_pads_with_ten_frames() {
    let config = test_config("frame_count_short");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();
    let script = RevealScript::new(vec![
        RevealStep::new(["P"], Vec::<String>::new()),
        RevealStep::new(["P", "A"], ["P-->A"]),
        RevealStep::new(["P", "A", "B"], ["P-->A", "A-->B"]),
    ])
    .unwrap();

    let frames = build_frames(&ctx, &source(), &script, scratch.path())
        .await
        .unwrap();
    assert_eq!(frames.len(), 13);
    assert_eq!(frames.pause_len(), 10);

    scratch.remove().unwrap();
    cleanup(&config);
}

/// The renderer cannot hide nodes, so every reveal step is rendered from
/// the same complete source. Frames before the last step therefore show
/// nodes that should not be visible yet.
#[tokio::test]
async fn every_frame_renders_complete_diagram() {
    let config = test_config("complete_frames");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();

    build_frames(
        &ctx,
        &source(),
        &RevealScript::default_workflow(),
        scratch.path(),
    )
    .await
    .unwrap();

    let inputs: Vec<_> = runner
        .calls()
        .iter()
        .map(|c| c.value_of("-i").unwrap().clone())
        .collect();
    assert_eq!(inputs.len(), 6);
    assert!(inputs.iter().all(|i| *i == fixture_source().into_os_string()));
    assert!(runner
        .calls()
        .iter()
        .all(|c| c.value_of("-b").unwrap() == "white"));

    scratch.remove().unwrap();
    cleanup(&config);
}

#[tokio::test]
async fn failed_frame_yields_no_sequence() {
    let config = test_config("frame_failure");
    let runner = FakeToolchain::all_tools().failing_on("frame-003.png");
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();

    let err = build_frames(
        &ctx,
        &source(),
        &RevealScript::default_workflow(),
        scratch.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, WfgenError::SequenceBuild { .. }));
    assert!(err.to_string().contains("frame 4 of 6"));
    // Rendering stops at the failed frame.
    assert_eq!(runner.calls().len(), 4);

    drop(scratch);
    assert!(!config.frames_dir().exists());
    cleanup(&config);
}

async fn sequence_loop_leaves_no_palette(runner: FakeToolchain, name: &str) -> bool {
    let config = test_config(name);
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();
    let frames = build_frames(
        &ctx,
        &source(),
        &RevealScript::default_workflow(),
        scratch.path(),
    )
    .await
    .unwrap();

    let result = encode_loop(&ctx, LoopInput::Sequence(&frames)).await;
    let palette_left = config.output_path(PALETTE_FILE).exists();

    scratch.remove().unwrap();
    cleanup(&config);
    assert!(!palette_left, "palette left behind");
    result.is_ok()
}

#[tokio::test]
async fn palette_removed_after_success() {
    assert!(sequence_loop_leaves_no_palette(FakeToolchain::all_tools(), "palette_ok").await);
}

#[tokio::test]
async fn palette_removed_when_second_pass_fails() {
    let runner = FakeToolchain::all_tools().failing_on("workflow.gif");
    assert!(!sequence_loop_leaves_no_palette(runner, "palette_pass_two").await);
}

#[tokio::test]
async fn palette_removed_when_first_pass_fails_midway() {
    let runner = FakeToolchain::all_tools().failing_after_writing(PALETTE_FILE);
    assert!(!sequence_loop_leaves_no_palette(runner, "palette_pass_one").await);
}

#[tokio::test]
async fn encoders_refuse_without_encoder_capability() {
    let config = test_config("no_encoder_stage");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(
        &runner,
        &config,
        CapabilitySet {
            renderer_available: true,
            encoder_available: Some(false),
        },
    );
    let scratch = ScratchDir::create(config.frames_dir()).unwrap();
    let frames = build_frames(
        &ctx,
        &source(),
        &RevealScript::default_workflow(),
        scratch.path(),
    )
    .await
    .unwrap();
    let calls_before = runner.calls().len();

    assert!(encode_video(&ctx, &frames).await.is_err());
    assert!(encode_loop(&ctx, LoopInput::Sequence(&frames)).await.is_err());
    assert_eq!(runner.calls().len(), calls_before);

    scratch.remove().unwrap();
    cleanup(&config);
}

#[tokio::test]
async fn static_loop_requires_existing_raster() {
    let config = test_config("static_missing");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let raster = Artifact {
        kind: ArtifactKind::Raster,
        path: config.output_path("workflow.png"),
    };

    let err = encode_loop(&ctx, LoopInput::Static(&raster))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(runner.calls().is_empty());

    cleanup(&config);
}

#[tokio::test]
async fn archive_of_raster_and_vector_has_two_entries() {
    let config = test_config("archive_two");
    let runner = FakeToolchain::all_tools();
    let ctx = StageContext::new(&runner, &config, ALL_TOOLS);
    let mut set = ArtifactSet::new();
    set.insert(render_raster(&ctx, &source()).await.unwrap());
    set.insert(
        render_vector(&ctx, &source(), &RevealScript::default_workflow())
            .await
            .unwrap(),
    );

    let archive = package(&set, &config).await.unwrap();
    assert_eq!(
        support::archive_entries(archive.path()),
        ["workflow.png", "workflow.svg"]
    );

    cleanup(&config);
}
