#[cfg(test)]
mod tests {
    use crate::accounting::Allocation;
    use crate::pool::LicensePool;
    use crate::transport::{Method, Request, Transport};
    use crate::transport_in_memory::InMemoryTransport;
    use crate::wire::{self, ErrorResponse};

    fn transport() -> InMemoryTransport {
        InMemoryTransport::new(LicensePool::new().with_tool("cad_tool", Allocation::fixed(1)))
    }

    fn borrow_request(tool: &str) -> Request {
        Request::post(wire::BORROW_PATH, format!(r#"{{"tool":"{}","user":"alice"}}"#, tool))
    }

    #[test]
    fn test_in_memory_borrow_statuses() {
        let mut transport = transport();

        let ok = transport.exchange(&borrow_request("cad_tool")).unwrap();
        assert_eq!(ok.status, 200);
        let body: serde_json::Value = serde_json::from_str(&ok.body).unwrap();
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

        let exhausted = transport.exchange(&borrow_request("cad_tool")).unwrap();
        assert_eq!(exhausted.status, 409);
        let err: ErrorResponse = serde_json::from_str(&exhausted.body).unwrap();
        assert!(err.error.contains("cad_tool"));

        let unknown = transport.exchange(&borrow_request("cam_tool")).unwrap();
        assert_eq!(unknown.status, 404);
    }

    #[test]
    fn test_in_memory_return_unknown_lease() {
        let mut transport = transport();
        let res = transport
            .exchange(&Request::post(wire::RETURN_PATH, r#"{"id":"missing"}"#.to_string()))
            .unwrap();
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_in_memory_bad_body_and_route() {
        let mut transport = transport();

        let bad = transport
            .exchange(&Request::post(wire::BORROW_PATH, "{".to_string()))
            .unwrap();
        assert_eq!(bad.status, 400);

        let no_route = transport
            .exchange(&Request::post("/licenses/steal", "{}".to_string()))
            .unwrap();
        assert_eq!(no_route.status, 400);

        let no_get_route = transport.exchange(&Request::get("/nowhere")).unwrap();
        assert_eq!(no_get_route.status, 400);
    }

    #[test]
    fn test_in_memory_status_routes() {
        let mut transport = transport();

        let one = transport.exchange(&Request::get(wire::status_path("cad_tool"))).unwrap();
        assert_eq!(one.status, 200);
        let status: crate::types::LicenseStatus = serde_json::from_str(&one.body).unwrap();
        assert_eq!(status.total, 1);
        assert_eq!(status.commit, 1);

        let all = transport.exchange(&Request::get(wire::STATUS_ALL_PATH)).unwrap();
        let statuses: Vec<crate::types::LicenseStatus> = serde_json::from_str(&all.body).unwrap();
        assert_eq!(statuses.len(), 1);

        let borrows = transport
            .exchange(&Request::get(wire::BORROWS_PATH).with_query("user", "nobody"))
            .unwrap();
        assert_eq!(borrows.body, "[]");
    }

    #[test]
    fn test_request_builders() {
        let req = Request::get("/borrows").with_query("user", "alice");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.query, vec![("user".to_string(), "alice".to_string())]);
        assert!(req.body.is_none());
        assert_eq!(Method::Post.as_str(), "POST");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_transport_validates_base_url() {
        use crate::error::LeaseError;
        use crate::transport_http::HttpTransport;
        use std::time::Duration;

        let transport = HttpTransport::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");

        assert!(matches!(
            HttpTransport::new("localhost:8000", Duration::from_secs(1)),
            Err(LeaseError::InvalidArgument(_))
        ));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_unreachable_endpoint_is_connection_error() {
        use crate::client::{ClientConfig, LeasingClient};
        use crate::error::LeaseError;
        use std::time::Duration;

        // Port 9 (discard) on loopback is not expected to accept connections
        let config = ClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_millis(500));
        let client = LeasingClient::connect(&config).unwrap();
        assert!(matches!(client.borrow("cad_tool", "alice"), Err(LeaseError::Connection(_))));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_silent_endpoint_times_out() {
        use crate::client::{ClientConfig, LeasingClient};
        use crate::error::LeaseError;
        use std::net::TcpListener;
        use std::time::{Duration, Instant};

        // Accepts the connection and never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            std::thread::sleep(Duration::from_secs(1));
            drop(stream);
        });

        let config =
            ClientConfig::new(format!("http://{}", addr)).with_timeout(Duration::from_millis(300));
        let client = LeasingClient::connect(&config).unwrap();

        let started = Instant::now();
        let outcome = client.borrow("cad_tool", "alice");
        let elapsed = started.elapsed();

        match outcome {
            Err(LeaseError::Connection(_)) => {}
            other => panic!("expected a connection error, got {:?}", other),
        }
        assert!(elapsed >= Duration::from_millis(250), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(2), "returned after {:?}", elapsed);

        server.join().unwrap();
    }

    #[test]
    fn test_in_memory_overage_charges_and_all_users() {
        let allocation = Allocation::with_commit(2, 1, 1)
            .unwrap()
            .with_pricing(1000.0, 250.0)
            .unwrap();
        let mut transport = InMemoryTransport::new(LicensePool::new().with_tool("davinci", allocation));

        let empty = transport.exchange(&Request::get(wire::OVERAGE_CHARGES_PATH)).unwrap();
        assert_eq!(empty.status, 200);
        let body: wire::OverageChargesResponse = serde_json::from_str(&empty.body).unwrap();
        assert!(body.charges.is_empty());

        transport.exchange(&borrow_request("davinci")).unwrap();
        transport.exchange(&borrow_request("davinci")).unwrap();

        let res = transport.exchange(&Request::get(wire::OVERAGE_CHARGES_PATH)).unwrap();
        let body: wire::OverageChargesResponse = serde_json::from_str(&res.body).unwrap();
        assert_eq!(body.charges.len(), 1);
        assert_eq!(body.charges[0].amount, 250.0);
        assert_eq!(body.total, 250.0);

        let all = transport
            .exchange(&Request::get(wire::BORROWS_PATH).with_query("user", "all"))
            .unwrap();
        let records: Vec<crate::types::BorrowRecord> = serde_json::from_str(&all.body).unwrap();
        assert_eq!(records.len(), 2);
    }
}
