use std::sync::Once;

use anyhow::{Result, anyhow};
use bytes::{Bytes, BytesMut};
use stun_agent::{
    Agent, AgentOptions, Compatibility, Error, IntegrityKey, StaticValidater, Usage,
    ValidaterData, ValidationStatus,
    transaction::MAX_SAVED_TRANSACTIONS,
};
use stun_agent::codec::{
    Attributes,
    message::{
        Message, MessageEncoder, TransactionId,
        attributes::{error::ErrorType, *},
        methods::*,
    },
};

fn logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Trace)
            .init();
    });
}

fn agent(usage: Usage) -> Agent {
    logger();
    Agent::new(AgentOptions::new(
        AgentOptions::default_known_attributes(),
        Compatibility::Rfc5389,
        usage,
    ))
}

fn users() -> StaticValidater {
    StaticValidater::new([
        ValidaterData::new("alice", "secret"),
        ValidaterData::new("bob", "hunter2"),
    ])
}

fn nobody(_: &Message<'_>, _: &[u8]) -> Option<Bytes> {
    None
}

/// An unsigned success response, as a peer would send it.
fn response(id: &TransactionId, method: Method) -> BytesMut {
    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(method, MessageClass::Response, id, &mut bytes)
        .append::<XorMappedAddress>("192.168.1.10:40000".parse().unwrap());
    bytes
}

/// Append an attribute type the codec has no name for.
fn append_raw(bytes: &mut BytesMut, kind: u16) {
    bytes.extend_from_slice(&kind.to_be_bytes());
    bytes.extend_from_slice(&[0x00, 0x04, 0xde, 0xad, 0xbe, 0xef]);
    let len = (bytes.len() - 20) as u16;
    bytes[2..4].copy_from_slice(&len.to_be_bytes());
}

#[test]
fn test_short_buffers_are_not_stun() {
    let mut agent = agent(Usage::empty());
    let bytes = [0u8; 20];

    for len in 0..20 {
        let mut attributes = Attributes::default();
        let (status, message) = agent.validate(&bytes[..len], &mut attributes, &users());
        assert_eq!(status, ValidationStatus::NotStun);
        assert!(message.is_none());
    }
}

#[test]
fn test_incomplete_and_malformed_buffers() -> Result<()> {
    let mut agent = agent(Usage::empty());
    let mut request = agent.init_indication(Method::Binding, 1280)?;
    request.append::<UserName>(b"alice")?;
    let bytes = request.as_bytes();

    let mut attributes = Attributes::default();
    let (status, _) = agent.validate(&bytes[..bytes.len() - 4], &mut attributes, &users());
    assert_eq!(status, ValidationStatus::IncompleteStun);

    let mut garbage = bytes.to_vec();
    garbage[0] = 0x80;
    let (status, _) = agent.validate(&garbage, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::NotStun);

    let mut trailing = bytes.to_vec();
    trailing.extend_from_slice(&[0, 0, 0, 0]);
    let (status, _) = agent.validate(&trailing, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::NotStun);

    Ok(())
}

#[test]
fn test_signed_request_is_accepted() -> Result<()> {
    let mut agent = Agent::new(AgentOptions::new(
        vec![0x0001, 0x0006, 0x0008],
        Compatibility::Rfc5389,
        Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT,
    ));

    let mut request = agent.init_request(Method::Binding, 1280)?;
    request.append::<UserName>(b"alice")?;
    let len = agent.finish_message(&mut request, Some(b"secret".as_slice()))?;
    assert_eq!(len, request.len());

    let validater = |_: &Message<'_>, username: &[u8]| {
        (username == b"alice").then(|| Bytes::from_static(b"secret"))
    };

    let mut attributes = Attributes::default();
    let (status, message) = agent.validate(request.as_bytes(), &mut attributes, &validater);
    let message = message.ok_or_else(|| anyhow!("no message"))?;

    assert_eq!(status, ValidationStatus::Success);
    assert_eq!(message.get::<UserName>(), Some(&b"alice"[..]));
    assert_eq!(message.transaction_id(), *request.transaction_id());
    assert!(message.verify_fingerprint().is_ok());
    assert_eq!(message.key(), Some(&IntegrityKey::short_term(b"secret")));

    Ok(())
}

#[test]
fn test_request_response_round_trip() -> Result<()> {
    let usage = Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT;
    let mut client = agent(usage);
    let mut server = agent(usage);

    let mut request = client.init_request(Method::Binding, 1280)?;
    let id = *request.transaction_id();
    assert!(client.transactions().find(&id, Method::Binding).is_some());

    request.append::<UserName>(b"bob")?;
    request.append::<Priority>(0x6e0001ff)?;
    client.finish_message(&mut request, Some(b"hunter2".as_slice()))?;

    let mut attributes = Attributes::default();
    let (status, received) = server.validate(request.as_bytes(), &mut attributes, &users());
    let received = received.ok_or_else(|| anyhow!("no message"))?;
    assert_eq!(status, ValidationStatus::Success);

    let mut response = server.init_response(&received, 1280)?;
    response.append::<XorMappedAddress>("10.0.0.1:3478".parse()?)?;
    server.finish_message(&mut response, None)?;
    assert_eq!(response.transaction_id(), &id);

    let mut attributes = Attributes::default();
    let (status, answer) = client.validate(response.as_bytes(), &mut attributes, &nobody);
    let answer = answer.ok_or_else(|| anyhow!("no message"))?;

    assert_eq!(status, ValidationStatus::Success);
    assert_eq!(answer.class(), MessageClass::Response);
    assert_eq!(answer.get::<XorMappedAddress>(), Some("10.0.0.1:3478".parse()?));
    assert_eq!(answer.key(), Some(&IntegrityKey::short_term(b"hunter2")));
    assert!(!client.transactions().contains(&id));

    // the transaction is single use.
    let mut attributes = Attributes::default();
    let (status, _) = client.validate(response.as_bytes(), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    Ok(())
}

#[test]
fn test_response_signed_with_another_key_is_unmatched() -> Result<()> {
    let mut client = agent(Usage::SHORT_TERM_CREDENTIALS);
    let mut request = client.init_request(Method::Binding, 1280)?;
    request.append::<UserName>(b"alice")?;
    client.finish_message(&mut request, Some(b"secret".as_slice()))?;
    let id = *request.transaction_id();

    let mut attributes = Attributes::default();
    let mut bytes = BytesMut::with_capacity(1280);

    {
        let mut encoder =
            MessageEncoder::new(Method::Binding, MessageClass::Response, &id, &mut bytes);
        encoder.append::<XorMappedAddress>("10.0.0.1:3478".parse()?);
        encoder.append_integrity(b"not-the-secret", false);
    }

    let (status, _) = client.validate(&bytes, &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    // unsigned while the request was signed.
    let (status, _) = client.validate(&response(&id, Method::Binding), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    // wrong method.
    let (status, _) = client.validate(&response(&id, Method::Allocate), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    // a 401 from a peer that could not check us is fine unsigned.
    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(Method::Binding, MessageClass::Error, &id, &mut bytes)
        .append::<ErrorCode>(ErrorCode::from(ErrorType::Unauthorized));

    let (status, message) = client.validate(&bytes, &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::Success);
    assert_eq!(
        message.and_then(|it| it.get::<ErrorCode>()).map(|it| it.number()),
        Some(401)
    );

    Ok(())
}

#[test]
fn test_oldest_transactions_are_evicted() -> Result<()> {
    let mut agent = agent(Usage::empty());

    let mut ids = Vec::new();
    for _ in 0..MAX_SAVED_TRANSACTIONS + 2 {
        let request = agent.init_request(Method::Binding, 1280)?;
        ids.push(*request.transaction_id());
    }

    assert_eq!(agent.transactions().len(), MAX_SAVED_TRANSACTIONS);
    assert!(!agent.transactions().contains(&ids[0]));
    assert!(!agent.transactions().contains(&ids[1]));

    let mut attributes = Attributes::default();
    for (index, id) in ids.iter().enumerate() {
        let (status, _) = agent.validate(&response(id, Method::Binding), &mut attributes, &nobody);
        if index < 2 {
            assert_eq!(status, ValidationStatus::UnmatchedResponse);
        } else {
            assert_eq!(status, ValidationStatus::Success);
        }
    }

    assert!(agent.transactions().is_empty());

    Ok(())
}

#[test]
fn test_finishing_an_evicted_request_keeps_it_unmatched() -> Result<()> {
    let mut agent = agent(Usage::empty());

    let mut first = agent.init_request(Method::Binding, 1280)?;
    let mut others = Vec::new();
    for _ in 0..MAX_SAVED_TRANSACTIONS {
        others.push(*agent.init_request(Method::Binding, 1280)?.transaction_id());
    }

    assert!(!agent.transactions().contains(first.transaction_id()));

    agent.finish_message(&mut first, None)?;
    assert!(!agent.transactions().contains(first.transaction_id()));
    assert!(agent.transactions().contains(&others[0]));

    let mut attributes = Attributes::default();
    let (status, _) = agent.validate(
        &response(first.transaction_id(), Method::Binding),
        &mut attributes,
        &nobody,
    );
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    let (status, _) =
        agent.validate(&response(&others[0], Method::Binding), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::Success);

    Ok(())
}

#[test]
fn test_signed_requests_are_evicted_in_order() -> Result<()> {
    let mut client = agent(Usage::SHORT_TERM_CREDENTIALS);
    let mut server = agent(Usage::SHORT_TERM_CREDENTIALS);

    let mut requests = Vec::new();
    for _ in 0..MAX_SAVED_TRANSACTIONS + 2 {
        let mut request = client.init_request(Method::Binding, 1280)?;
        request.append::<UserName>(b"alice")?;
        client.finish_message(&mut request, Some(b"secret".as_slice()))?;
        requests.push(request);
    }

    assert_eq!(client.transactions().len(), MAX_SAVED_TRANSACTIONS);

    let key = IntegrityKey::short_term(b"secret");
    for request in &requests[2..] {
        let saved = client
            .transactions()
            .get(request.transaction_id())
            .ok_or_else(|| anyhow!("request evicted"))?;
        assert_eq!(saved.key.as_ref(), Some(&key));
    }

    for (index, request) in requests.iter().enumerate() {
        let mut attributes = Attributes::default();
        let (status, received) = server.validate(request.as_bytes(), &mut attributes, &users());
        let received = received.ok_or_else(|| anyhow!("no message"))?;
        assert_eq!(status, ValidationStatus::Success);

        let mut response = server.init_response(&received, 1280)?;
        response.append::<XorMappedAddress>("10.0.0.1:3478".parse()?)?;
        server.finish_message(&mut response, None)?;

        let mut attributes = Attributes::default();
        let (status, _) = client.validate(response.as_bytes(), &mut attributes, &nobody);
        if index < 2 {
            assert_eq!(status, ValidationStatus::UnmatchedResponse);
        } else {
            assert_eq!(status, ValidationStatus::Success);
        }
    }

    assert!(client.transactions().is_empty());

    Ok(())
}

#[test]
fn test_unnamed_method_matches_its_wire_value() -> Result<()> {
    let mut agent = agent(Usage::empty());
    let mut request = agent.init_request(Method::Other(0x001), 1280)?;
    agent.finish_message(&mut request, None)?;
    assert_eq!(request.method(), Method::Binding);

    let mut attributes = Attributes::default();
    let (status, _) = agent.validate(
        &response(request.transaction_id(), Method::Binding),
        &mut attributes,
        &nobody,
    );
    assert_eq!(status, ValidationStatus::Success);

    Ok(())
}

#[test]
fn test_fingerprint_detects_any_flipped_byte() -> Result<()> {
    let mut agent = agent(Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT);
    let mut request = agent.init_request(Method::Binding, 1280)?;
    request.append::<UserName>(b"alice")?;
    request.append::<IceControlling>(0x1122334455667788)?;
    agent.finish_message(&mut request, Some(b"secret".as_slice()))?;

    let bytes = request.as_bytes().to_vec();
    let mut attributes = Attributes::default();

    let (status, _) = agent.validate(&bytes, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::Success);

    for index in 0..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x01;

        let (status, _) = agent.validate(&tampered, &mut attributes, &users());
        assert_ne!(status, ValidationStatus::Success, "byte {} flipped", index);
    }

    // past the header, structure holds and only the fingerprint gives it away.
    let mut tampered = bytes.clone();
    tampered[25] ^= 0x01;
    let (status, _) = agent.validate(&tampered, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::BadRequest);

    Ok(())
}

#[test]
fn test_missing_cookie_or_fingerprint_is_bad_request() -> Result<()> {
    let mut agent = agent(Usage::USE_FINGERPRINT);
    let mut attributes = Attributes::default();

    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(
        Method::Binding,
        MessageClass::Request,
        &TransactionId::new([9; 16]),
        &mut bytes,
    )
    .append_fingerprint();

    let (status, message) = agent.validate(&bytes, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::BadRequest);
    assert!(message.is_some());

    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(
        Method::Binding,
        MessageClass::Request,
        &TransactionId::with_cookie([9; 12]),
        &mut bytes,
    )
    .append::<Priority>(1);

    let (status, _) = agent.validate(&bytes, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::BadRequest);

    Ok(())
}

#[test]
fn test_unknown_request_attribute() -> Result<()> {
    let mut agent = Agent::new(AgentOptions::new(
        vec![0x0001, 0x0006, 0x0008],
        Compatibility::Rfc5389,
        Usage::empty(),
    ));

    let id = TransactionId::with_cookie([3; 12]);
    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(Method::Binding, MessageClass::Request, &id, &mut bytes)
        .append::<UserName>(b"alice");

    append_raw(&mut bytes, 0x0031);
    append_raw(&mut bytes, 0x8031);

    let mut attributes = Attributes::default();
    let (status, request) = agent.validate(&bytes, &mut attributes, &users());
    let request = request.ok_or_else(|| anyhow!("no message"))?;
    assert_eq!(status, ValidationStatus::UnknownRequestAttribute);

    let error = agent.build_unknown_attributes_error(&request, 1280)?;
    assert_eq!(error.class(), MessageClass::Error);

    let mut attributes = Attributes::default();
    let message = Message::decode(error.as_bytes(), &mut attributes)?;

    assert_eq!(message.transaction_id(), id);
    assert_eq!(message.get::<ErrorCode>().map(|it| it.number()), Some(420));
    assert_eq!(message.get::<UnknownAttributes>(), Some(vec![0x0031]));

    Ok(())
}

#[test]
fn test_unknown_attribute_outside_requests() -> Result<()> {
    let mut agent = agent(Usage::empty());

    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(
        Method::Binding,
        MessageClass::Indication,
        &TransactionId::with_cookie([4; 12]),
        &mut bytes,
    );

    append_raw(&mut bytes, 0x0031);

    let mut attributes = Attributes::default();
    let (status, indication) = agent.validate(&bytes, &mut attributes, &users());
    assert_eq!(status, ValidationStatus::UnknownAttribute);

    let indication = indication.ok_or_else(|| anyhow!("no message"))?;
    assert!(matches!(agent.init_response(&indication, 1280), Err(Error::NotARequest)));

    Ok(())
}

#[test]
fn test_credentials_required() -> Result<()> {
    let mut agent = agent(Usage::SHORT_TERM_CREDENTIALS);
    let mut attributes = Attributes::default();

    let mut request = agent.init_request(Method::Binding, 1280)?;
    request.append::<Priority>(1)?;
    agent.finish_message(&mut request, None)?;

    let (status, _) = agent.validate(request.as_bytes(), &mut attributes, &users());
    assert_eq!(status, ValidationStatus::UnauthorizedBadRequest);

    // a username alone is as bad.
    let mut request = agent.init_request(Method::Binding, 1280)?;
    request.append::<UserName>(b"alice")?;
    agent.finish_message(&mut request, None)?;

    let (status, _) = agent.validate(request.as_bytes(), &mut attributes, &users());
    assert_eq!(status, ValidationStatus::UnauthorizedBadRequest);

    let mut ignoring = self::agent(Usage::SHORT_TERM_CREDENTIALS | Usage::IGNORE_CREDENTIALS);
    let mut request = ignoring.init_request(Method::Binding, 1280)?;
    request.append::<Priority>(1)?;
    ignoring.finish_message(&mut request, None)?;

    let (status, _) = ignoring.validate(request.as_bytes(), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::Success);

    Ok(())
}

#[test]
fn test_unauthorized() -> Result<()> {
    let mut agent = agent(Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT);
    let mut attributes = Attributes::default();

    for username in [&b"alice"[..], b"bob", b"mallory"] {
        let mut request = agent.init_request(Method::Binding, 1280)?;
        request.append::<UserName>(username)?;
        agent.finish_message(&mut request, Some(b"secret".as_slice()))?;

        let (status, _) = agent.validate(request.as_bytes(), &mut attributes, &nobody);
        assert_eq!(status, ValidationStatus::Unauthorized);
    }

    // a known user with the wrong password.
    let mut request = agent.init_request(Method::Binding, 1280)?;
    request.append::<UserName>(b"bob")?;
    agent.finish_message(&mut request, Some(b"secret".as_slice()))?;

    let (status, _) = agent.validate(request.as_bytes(), &mut attributes, &users());
    assert_eq!(status, ValidationStatus::Unauthorized);

    Ok(())
}

#[test]
fn test_long_term_credentials() -> Result<()> {
    let mut client = agent(Usage::LONG_TERM_CREDENTIALS);
    let mut server = agent(Usage::LONG_TERM_CREDENTIALS);
    let mut attributes = Attributes::default();

    let mut request = client.init_request(Method::Allocate, 1280)?;
    request.append::<UserName>(b"alice")?;
    request.append::<Realm>(b"localhost")?;
    request.append::<Nonce>(b"UHm1hiE0jm9r9rGS")?;
    client.finish_message(&mut request, Some(b"secret".as_slice()))?;

    let key = IntegrityKey::long_term(b"alice", b"localhost", b"secret");
    assert_eq!(request.key(), Some(&key));

    {
        let (status, received) = server.validate(request.as_bytes(), &mut attributes, &users());
        assert_eq!(status, ValidationStatus::Success);
        assert_eq!(received.as_ref().and_then(|it| it.key()), Some(&key));
    }

    // without a nonce.
    let mut request = client.init_request(Method::Allocate, 1280)?;
    request.append::<UserName>(b"alice")?;
    request.append::<Realm>(b"localhost")?;
    client.finish_message(&mut request, Some(b"secret".as_slice()))?;

    let (status, _) = server.validate(request.as_bytes(), &mut attributes, &users());
    assert_eq!(status, ValidationStatus::UnauthorizedBadRequest);

    Ok(())
}

#[test]
fn test_long_term_key_needs_username_and_realm() -> Result<()> {
    let mut agent = agent(Usage::LONG_TERM_CREDENTIALS);

    let mut request = agent.init_request(Method::Allocate, 1280)?;
    request.append::<UserName>(b"alice")?;
    let len = request.len();

    assert!(matches!(
        agent.finish_message(&mut request, Some(b"secret".as_slice())),
        Err(Error::MissingCredentials)
    ));
    assert_eq!(request.len(), len);
    assert!(request.key().is_none());

    // nothing to sign with is fine.
    agent.finish_message(&mut request, None)?;

    Ok(())
}

#[test]
fn test_indications_without_auth() -> Result<()> {
    let mut agent = agent(Usage::SHORT_TERM_CREDENTIALS | Usage::NO_INDICATION_AUTH);
    let mut attributes = Attributes::default();

    let mut indication = agent.init_indication(Method::Binding, 1280)?;
    agent.finish_message(&mut indication, None)?;
    assert!(agent.transactions().is_empty());

    let (status, _) = agent.validate(indication.as_bytes(), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::Success);

    agent.reset(AgentOptions::new(
        AgentOptions::default_known_attributes(),
        Compatibility::Rfc5389,
        Usage::SHORT_TERM_CREDENTIALS,
    ));

    let (status, _) = agent.validate(indication.as_bytes(), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnauthorizedBadRequest);

    Ok(())
}

#[test]
fn test_finish_rolls_back_when_full() -> Result<()> {
    let mut agent = agent(Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT);
    assert!(matches!(agent.init_request(Method::Binding, 19), Err(Error::BufferTooSmall)));

    // room for the username, not for integrity and fingerprint.
    let mut request = agent.init_request(Method::Binding, 40)?;
    request.append::<UserName>(b"alice")?;
    let len = request.len();

    assert!(matches!(
        agent.finish_message(&mut request, Some(b"secret".as_slice())),
        Err(Error::BufferTooSmall)
    ));
    assert_eq!(request.len(), len);

    let mut attributes = Attributes::default();
    let message = Message::decode(request.as_bytes(), &mut attributes)?;
    assert!(!message.has(AttributeType::MessageIntegrity));
    assert!(!message.has(AttributeType::Fingerprint));

    Ok(())
}

#[test]
fn test_software_and_forgotten_transactions() -> Result<()> {
    let mut agent = agent(Usage::ADD_SOFTWARE);
    agent.set_software(Some("test-agent".to_string()));

    let mut request = agent.init_request(Method::Binding, 1280)?;
    agent.finish_message(&mut request, None)?;

    let mut attributes = Attributes::default();
    let message = Message::decode(request.as_bytes(), &mut attributes)?;
    assert_eq!(message.get::<Software>(), Some("test-agent"));

    let id = *request.transaction_id();
    assert!(agent.forget_transaction(&id));
    assert!(!agent.forget_transaction(&id));

    let (status, _) = agent.validate(&response(&id, Method::Binding), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::UnmatchedResponse);

    let request = agent.init_request(Method::Binding, 1280)?;
    agent.reset(AgentOptions::default());
    assert!(!agent.transactions().contains(request.transaction_id()));

    Ok(())
}

#[test]
fn test_legacy_compatibility() -> Result<()> {
    logger();

    let options = AgentOptions::new(
        vec![0x0001, 0x0006, 0x0008, 0x0009, 0x000A],
        Compatibility::Rfc3489,
        Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT,
    );

    let mut client = Agent::new(options.clone());
    let mut server = Agent::new(options);

    let mut request = client.init_request(Method::Binding, 1280)?;
    assert!(!request.transaction_id().has_cookie());

    request.append::<UserName>(b"alice")?;
    client.finish_message(&mut request, Some(b"secret".as_slice()))?;

    {
        let mut attributes = Attributes::default();
        let message = Message::decode(request.as_bytes(), &mut attributes)?;
        assert!(!message.has(AttributeType::Fingerprint));
        assert!(message.verify_integrity(b"secret", true).is_ok());
    }

    let mut attributes = Attributes::default();
    let (status, received) = server.validate(request.as_bytes(), &mut attributes, &users());
    let received = received.ok_or_else(|| anyhow!("no message"))?;
    assert_eq!(status, ValidationStatus::Success);

    let mut response = server.init_response(&received, 1280)?;
    response.append::<MappedAddress>("10.0.0.1:3478".parse()?)?;
    server.finish_message(&mut response, None)?;

    let mut attributes = Attributes::default();
    let (status, _) = client.validate(response.as_bytes(), &mut attributes, &nobody);
    assert_eq!(status, ValidationStatus::Success);

    // an odd list of unknown attributes is padded.
    let mut bytes = BytesMut::with_capacity(1280);
    MessageEncoder::new(
        Method::Binding,
        MessageClass::Request,
        &TransactionId::new([6; 16]),
        &mut bytes,
    );

    append_raw(&mut bytes, 0x0031);

    let mut attributes = Attributes::default();
    let (status, request) = server.validate(&bytes, &mut attributes, &users());
    let request = request.ok_or_else(|| anyhow!("no message"))?;
    assert_eq!(status, ValidationStatus::UnknownRequestAttribute);

    let error = server.build_unknown_attributes_error(&request, 1280)?;
    let mut attributes = Attributes::default();
    let message = Message::decode(error.as_bytes(), &mut attributes)?;
    assert_eq!(message.get::<UnknownAttributes>(), Some(vec![0x0031, 0x0031]));

    Ok(())
}

// run with `cargo test --features serde`.
#[cfg(feature = "serde")]
#[test]
fn test_options_from_config() -> Result<()> {
    let options: AgentOptions = serde_json5::from_str(
        r#"{
            compatibility: "rfc3489",
            usage: 5,
            "known-attributes": [1, 6, 8],
        }"#,
    )?;

    assert_eq!(options.compatibility, Compatibility::Rfc3489);
    assert!(options.usage.contains(Usage::SHORT_TERM_CREDENTIALS | Usage::USE_FINGERPRINT));
    assert_eq!(options.known_attributes, vec![1, 6, 8]);
    assert_eq!(options.software, Some(AgentOptions::default_software()));

    Ok(())
}
