use std::time::Duration;

use bytes::Bytes;
use ex314_llm::{
    AssemblerState, LlmError, PlainTextDecoder, StreamFormat, StreamingReplyAssembler, UpstreamReply,
};
use futures::StreamExt;

#[tokio::test]
async fn test_plain_text_chunks_are_published_in_order() {
    let reply = UpstreamReply::from_chunks(
        vec!["Hel", "lo, ", "wor", "ld", "!"],
        StreamFormat::PlainText,
    );
    let mut seen = Vec::new();
    let mut assembler = StreamingReplyAssembler::new();

    let full = assembler
        .assemble(reply, |fragment, text| {
            seen.push((fragment.to_string(), text.to_string()))
        })
        .await
        .unwrap();

    assert_eq!(full, "Hello, world!");
    assert_eq!(assembler.state(), AssemblerState::Completed);
    assert_eq!(
        seen,
        vec![
            ("Hel".to_string(), "Hel".to_string()),
            ("lo, ".to_string(), "Hello, ".to_string()),
            ("wor".to_string(), "Hello, wor".to_string()),
            ("ld".to_string(), "Hello, world".to_string()),
            ("!".to_string(), "Hello, world!".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_each_update_extends_the_previous_one() {
    let reply = UpstreamReply::from_chunks(
        vec!["The ", "quick ", "", "brown ", "fox"],
        StreamFormat::PlainText,
    );
    let mut texts: Vec<String> = Vec::new();

    let full = StreamingReplyAssembler::new()
        .assemble(reply, |_, text| texts.push(text.to_string()))
        .await
        .unwrap();

    // empty chunk produces no update
    assert_eq!(texts.len(), 4);
    for pair in texts.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
        assert!(pair[1].len() > pair[0].len());
    }
    assert_eq!(texts.last().map(String::as_str), Some(full.as_str()));
}

#[tokio::test]
async fn test_empty_stream_completes_with_empty_text() {
    let reply = UpstreamReply::from_chunks(Vec::<&'static str>::new(), StreamFormat::PlainText);
    let mut calls = 0;
    let mut assembler = StreamingReplyAssembler::new();

    let full = assembler.assemble(reply, |_, _| calls += 1).await.unwrap();

    assert_eq!(full, "");
    assert_eq!(calls, 0);
    assert_eq!(assembler.state(), AssemblerState::Completed);
}

#[tokio::test]
async fn test_non_success_status_fails_before_any_callback() {
    let body = futures::stream::iter(vec![Ok::<_, LlmError>(Bytes::from_static(b"Bad gateway"))]);
    let reply = UpstreamReply::new(502, Some(Box::pin(body)), StreamFormat::PlainText);
    let mut calls = 0;
    let mut assembler = StreamingReplyAssembler::new();

    let err = assembler.assemble(reply, |_, _| calls += 1).await.unwrap_err();

    assert!(matches!(err, LlmError::UpstreamUnavailable { status: Some(502), .. }));
    assert!(err.is_upstream_failure());
    assert_eq!(calls, 0);
    assert_eq!(assembler.state(), AssemblerState::Failed);
}

#[tokio::test]
async fn test_missing_body_is_unavailable() {
    let reply = UpstreamReply::new(200, None, StreamFormat::PlainText);
    let err = StreamingReplyAssembler::new()
        .assemble(reply, |_, _| panic!("no callback expected"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::UpstreamUnavailable { .. }));
}

#[tokio::test]
async fn test_multibyte_characters_split_across_chunks() {
    // "héllo ✓" with both multi-byte sequences cut between chunks
    let bytes = "héllo ✓".as_bytes().to_vec();
    let chunks = vec![
        Bytes::copy_from_slice(&bytes[..2]),
        Bytes::copy_from_slice(&bytes[2..8]),
        Bytes::copy_from_slice(&bytes[8..]),
    ];
    let reply = UpstreamReply::from_chunks(chunks, StreamFormat::PlainText);
    let mut fragments = Vec::new();

    let full = StreamingReplyAssembler::new()
        .assemble(reply, |fragment, _| fragments.push(fragment.to_string()))
        .await
        .unwrap();

    assert_eq!(full, "héllo ✓");
    assert!(fragments.iter().all(|f| !f.contains('\u{FFFD}')));
    assert_eq!(fragments.concat(), "héllo ✓");
}

#[tokio::test]
async fn test_sse_reply_is_decoded_into_deltas() {
    let reply = UpstreamReply::from_chunks(
        vec![
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: {\"cho",
            "ices\":[{\"index\":0,\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n",
        ],
        StreamFormat::ChatCompletionSse,
    );
    let mut fragments = Vec::new();

    let full = StreamingReplyAssembler::new()
        .assemble(reply, |fragment, _| fragments.push(fragment.to_string()))
        .await
        .unwrap();

    assert_eq!(full, "Hi there");
    assert_eq!(fragments, vec!["Hi", " there"]);
}

#[tokio::test]
async fn test_cancel_stops_callbacks_even_for_buffered_fragments() {
    // three events arrive in a single read
    let reply = UpstreamReply::from_chunks(
        vec![concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"one \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"two \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"three\"}}]}\n\n",
        )],
        StreamFormat::ChatCompletionSse,
    );
    let mut assembler = StreamingReplyAssembler::new();
    let token = assembler.cancellation_token();
    let mut calls = 0;

    let err = assembler
        .assemble(reply, |_, _| {
            calls += 1;
            token.cancel();
        })
        .await
        .unwrap_err();

    assert_eq!(calls, 1);
    assert!(matches!(err, LlmError::Cancelled { ref partial } if partial == "one "));
    assert_eq!(assembler.state(), AssemblerState::Cancelled);
}

#[tokio::test]
async fn test_cancel_while_waiting_for_upstream() {
    let body = futures::stream::iter(vec![Ok::<_, LlmError>(Bytes::from_static(b"partial"))])
        .chain(futures::stream::pending());
    let reply = UpstreamReply::new(200, Some(Box::pin(body)), StreamFormat::PlainText);
    let mut assembler = StreamingReplyAssembler::new();
    let token = assembler.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        assembler.assemble(reply, |_, _| {}),
    )
    .await
    .expect("assembler must stop once cancelled");

    let err = result.unwrap_err();
    assert_eq!(err.partial(), Some("partial"));
    assert!(matches!(err, LlmError::Cancelled { .. }));
}

#[tokio::test]
async fn test_cancelled_before_start_never_reads() {
    let reply = UpstreamReply::from_chunks(vec!["never"], StreamFormat::PlainText);
    let mut assembler = StreamingReplyAssembler::new();
    assembler.cancellation_token().cancel();

    let err = assembler
        .assemble(reply, |_, _| panic!("no callback expected"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Cancelled { ref partial } if partial.is_empty()));
}

#[tokio::test]
async fn test_read_error_mid_stream_keeps_partial_text() {
    let body = futures::stream::iter(vec![
        Ok(Bytes::from_static(b"Hello, ")),
        Ok(Bytes::from_static(b"wor")),
        Err(LlmError::Decode("connection reset".to_string())),
        Ok(Bytes::from_static(b"ld")),
    ]);
    let reply = UpstreamReply::new(200, Some(Box::pin(body)), StreamFormat::PlainText);
    let mut texts = Vec::new();
    let mut assembler = StreamingReplyAssembler::new();

    let err = assembler
        .assemble(reply, |_, text| texts.push(text.to_string()))
        .await
        .unwrap_err();

    match err {
        LlmError::StreamInterrupted { partial, reason } => {
            assert_eq!(partial, "Hello, wor");
            assert!(reason.contains("connection reset"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(texts, vec!["Hello, ", "Hello, wor"]);
    assert_eq!(assembler.state(), AssemblerState::Failed);
}

#[tokio::test]
async fn test_malformed_event_interrupts_stream() {
    let reply = UpstreamReply::from_chunks(
        vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: {not json}\n\n",
        ],
        StreamFormat::ChatCompletionSse,
    );

    let err = StreamingReplyAssembler::new()
        .assemble(reply, |_, _| {})
        .await
        .unwrap_err();

    assert_eq!(err.partial(), Some("ok"));
    assert!(matches!(err, LlmError::StreamInterrupted { .. }));
}

#[tokio::test]
async fn test_decoder_override_takes_precedence_over_format() {
    // SSE-looking text treated as plain text
    let reply = UpstreamReply::from_chunks(vec!["data: x\n\n"], StreamFormat::ChatCompletionSse);

    let full = StreamingReplyAssembler::new()
        .with_decoder(Box::new(PlainTextDecoder::new()))
        .assemble(reply, |_, _| {})
        .await
        .unwrap();

    assert_eq!(full, "data: x\n\n");
}
