//! Newline-delimited JSON bus binding.
//!
//! Each line is one envelope. Lines that do not decode are logged and
//! skipped; they never stop the stream.

use async_trait::async_trait;
use futures::StreamExt;
use relay_core::domain::Envelope;
use relay_core::ports::{
    EnvelopeStream, EventSink, EventSource, SinkError, SourceError, Subscription,
};
use relay_core::typed::PayloadCodec;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

/// Envelopes read line by line from `R`. Supports a single subscription.
pub struct LineSource<R> {
    reader: Mutex<Option<R>>,
}

impl<R> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

#[async_trait]
impl<R> EventSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn subscribe(&self, subscription: &Subscription) -> Result<EnvelopeStream, SourceError> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| SourceError::Subscribe("line source already subscribed".to_string()))?;
        let wanted = subscription.clone();

        let stream = futures::stream::unfold(reader.lines(), |mut lines| async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match PayloadCodec::decode_envelope(line.as_bytes()) {
                        Ok(envelope) => return Some((envelope, lines)),
                        Err(err) => warn!(error = %err, "skipping undecodable line"),
                    },
                    Ok(None) => return None,
                    Err(err) => {
                        warn!(error = %err, "input stream failed");
                        return None;
                    }
                }
            }
        })
        .filter(move |envelope| {
            let keep = wanted.matches(envelope.event_type());
            if !keep {
                tracing::debug!(event_type = envelope.event_type(), "not subscribed, dropping");
            }
            async move { keep }
        });

        Ok(stream.boxed())
    }
}

/// Writes each published envelope as one line to `W`.
pub struct LineSink<W> {
    writer: Mutex<W>,
}

impl<W> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> EventSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&self, envelope: &Envelope) -> Result<(), SinkError> {
        let mut line = PayloadCodec::encode_envelope(envelope)
            .map_err(|err| SinkError::Rejected(err.to_string()))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|err| SinkError::Unavailable(err.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|err| SinkError::Unavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::domain::EventType;
    use std::io::Cursor;

    const ACTION: &str = r#"{"type":"sh.keptn.event.action.triggered","id":"t-1","shkeptncontext":"ctx-1","source":"shipyard","time":"2024-01-01T00:00:00Z","data":{"project":"p","stage":"s","service":"svc","action":"action-xyz"}}"#;

    #[tokio::test]
    async fn reads_subscribed_envelopes_and_skips_garbage() {
        let input = format!(
            "{ACTION}\nnot json\n\n{}\n",
            ACTION.replace("action.triggered", "action.finished")
        );
        let source = LineSource::new(Cursor::new(input.into_bytes()));
        let sub = Subscription::Types(vec![EventType::triggered("sh.keptn.event", "action")]);

        let got: Vec<Envelope> = source.subscribe(&sub).await.unwrap().collect().await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].context().as_str(), "ctx-1");
    }

    #[tokio::test]
    async fn envelope_without_time_is_delivered() {
        let input = ACTION.replace(r#""time":"2024-01-01T00:00:00Z","#, "");
        let source = LineSource::new(Cursor::new(input.into_bytes()));
        let sub = Subscription::Triggered {
            namespace: "sh.keptn.event".to_string(),
        };

        let got: Vec<Envelope> = source.subscribe(&sub).await.unwrap().collect().await;
        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn second_subscription_is_rejected() {
        let source = LineSource::new(Cursor::new(Vec::new()));
        let sub = Subscription::Types(Vec::new());
        let _stream = source.subscribe(&sub).await.unwrap();
        assert!(source.subscribe(&sub).await.is_err());
    }

    #[tokio::test]
    async fn sink_writes_one_line_per_envelope() {
        let envelope = PayloadCodec::decode_envelope(ACTION.as_bytes()).unwrap();
        let sink = LineSink::new(Vec::new());
        sink.publish(&envelope).await.unwrap();
        sink.publish(&envelope).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let back = PayloadCodec::decode_envelope(lines[1].as_bytes()).unwrap();
        assert_eq!(back.id(), envelope.id());
    }
}
