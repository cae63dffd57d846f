//! A pad talking to a real gateway on an ephemeral port.

use mathpad_client::{HttpTransport, Pad, Point, Surface};
use mathpad_error::ErrorKind;
use mathpad_gateway::{router, ScriptedModel, Solver, SolverConfig};
use std::sync::Arc;
use std::time::Duration;

async fn spawn_gateway(model: ScriptedModel) -> (String, Arc<Solver<ScriptedModel>>) {
    let solver = Arc::new(Solver::new(
        model,
        SolverConfig::default().with_retries(0, Duration::from_millis(1)),
    ));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = router(solver.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), solver)
}

fn draw_stroke(surface: &mut Surface, y: u32) {
    for x in 10..30 {
        surface.set_pixel(x, y, [20, 20, 20, 255]);
    }
}

#[tokio::test]
async fn assignment_carries_into_next_solve() {
    let model = ScriptedModel::replying(r#"[{"expr": "x", "result": "2", "assign": true}]"#)
        .then_reply(r#"[{"expr": "x + 3", "result": "5"}]"#);
    let (base, solver) = spawn_gateway(model).await;

    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
    let mut pad = Pad::new(Surface::new(80, 40), transport);

    draw_stroke(pad.surface_mut(), 12);
    let first = pad.solve().await.unwrap();
    assert!(first[0].is_assignment);
    assert_eq!(pad.state().variables().get("x"), Some("2"));
    assert!(pad.surface().is_blank());

    draw_stroke(pad.surface_mut(), 20);
    let second = pad.solve().await.unwrap();
    assert_eq!(second[0].result, "5");

    let sent = solver.model().last_request().unwrap();
    assert!(sent.prompt.contains(r#""x":"2""#));
    assert!(!sent.image.data.is_empty());

    let texts: Vec<_> = pad.state().labels().iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["x = 2", "x + 3 = 5"]);
    assert_eq!(pad.state().labels()[1].position, Point::new(19.5, 20.0));
}

#[tokio::test]
async fn gateway_error_surfaces_without_touching_canvas() {
    let (base, _) = spawn_gateway(ScriptedModel::replying("The answer is four.")).await;

    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
    let mut pad = Pad::new(Surface::new(40, 40), transport);
    draw_stroke(pad.surface_mut(), 5);

    let err = pad.solve().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailed);
    assert!(!pad.surface().is_blank());
    assert!(pad.state().labels().is_empty());
}

#[tokio::test]
async fn reset_then_blank_solve_sends_nothing() {
    let (base, solver) = spawn_gateway(ScriptedModel::replying(r#"[{"expr": "1+1", "result": 2}]"#)).await;

    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
    let mut pad = Pad::new(Surface::new(40, 40), transport);
    draw_stroke(pad.surface_mut(), 5);
    pad.solve().await.unwrap();

    pad.reset();
    let err = pad.solve().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(solver.model().calls(), 1);
}
