mod support;
use support::server;
use support::transport::{Reply, Scripted};

use std::time::Duration;

use request_promise::Agent;

#[tokio::test]
async fn agent_timeout() {
    let _ = env_logger::try_init();

    let server = server::http(move |_req| {
        async {
            // delay returning the response
            tokio::time::sleep(Duration::from_millis(300)).await;
            http::Response::default()
        }
    });

    let agent = Agent::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let url = format!("http://{}/slow", server.addr());

    let err = agent.get(&url).end().await.unwrap_err();

    assert!(err.is_timeout());
    assert!(err.is_request());
    assert!(err.response().is_none());
    assert_eq!(err.url().map(|u| u.as_str()), Some(url.as_str()));
}

#[tokio::test]
async fn request_timeout() {
    let _ = env_logger::try_init();

    let server = server::http(move |_req| {
        async {
            // delay returning the response
            tokio::time::sleep(Duration::from_millis(300)).await;
            http::Response::default()
        }
    });

    let agent = Agent::new();

    let url = format!("http://{}/slow", server.addr());

    let res = agent
        .get(&url)
        .timeout(Duration::from_millis(100))
        .end()
        .await;

    let err = res.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.url().map(|u| u.as_str()), Some(url.as_str()));
}

#[tokio::test]
async fn request_timeout_overrides_agent() {
    let _ = env_logger::try_init();

    let transport = Scripted::new(Reply::Hang);
    let agent = Agent::builder()
        .base_url(support::transport::BASE.parse().unwrap())
        .timeout(Duration::from_secs(30))
        .transport(transport.clone())
        .build()
        .unwrap();

    let err = agent
        .get("/hang")
        .timeout(Duration::from_millis(50))
        .end()
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(!err.is_abort());
}

#[tokio::test]
async fn fast_response_beats_timeout() {
    let _ = env_logger::try_init();

    let server = server::http(move |_req| async { http::Response::new("fast".to_string()) });

    let agent = Agent::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let res = agent.get(server.url("/fast")).end().await.unwrap();
    assert_eq!(res.text().unwrap(), "fast");
}

#[tokio::test]
async fn connect_timeout_is_configurable() {
    let _ = env_logger::try_init();

    let agent = Agent::builder()
        .connect_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    // nothing listens here, so the connection is refused before the timeout
    let url = format!("http://{}/", server::closed_addr());
    let err = agent.get(&url).end().await.unwrap_err();

    assert!(err.is_connect());
    assert!(!err.is_timeout());
}
