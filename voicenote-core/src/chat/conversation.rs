use crate::models::artifact::RecordingArtifact;
use crate::models::chat::{
    Attachment, Message, MessageStatus, PromptContent, PromptMessage, PromptPart, PromptRole, Role,
};
use crate::traits::assistant_client::{AssistantClient, ClientError};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Keep replies concise and \
friendly. You can read attached documents and images and help with everyday tasks.";

/// In-memory conversation log between the user and the assistant.
///
/// State is memory-only and lost on drop. Provider failures never escape as
/// errors from the send methods; they become assistant messages with `Error`
/// status so the caller always has a renderable log.
pub struct Conversation {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Append a user message and request the assistant's reply.
    pub fn send_text(
        &mut self,
        client: &dyn AssistantClient,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> &Message {
        let mut user = Message::new(Role::User, text, MessageStatus::Sent);
        user.attachments = attachments;
        self.messages.push(user);
        self.request_reply(client)
    }

    /// Transcribe a finished voice note and send the transcript.
    ///
    /// On transcription failure no user message is created; an assistant
    /// error message is appended instead.
    pub fn send_recording(
        &mut self,
        client: &dyn AssistantClient,
        recording: &RecordingArtifact,
    ) -> &Message {
        match client.transcribe(recording) {
            Ok(transcript) => {
                let mut user = Message::new(Role::User, transcript, MessageStatus::Sent);
                user.audio_path = Some(recording.path.clone());
                self.messages.push(user);
                self.request_reply(client)
            }
            Err(e) => {
                log::warn!("voice note transcription failed: {}", e);
                self.push_assistant_error("The voice note could not be transcribed. Please try again.")
            }
        }
    }

    /// Synthesize speech audio for an existing message.
    pub fn speak(
        &self,
        client: &dyn AssistantClient,
        message_id: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let message = self
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ClientError::Api(format!("unknown message id: {}", message_id)))?;
        client.synthesize_speech(&message.content)
    }

    fn request_reply(&mut self, client: &dyn AssistantClient) -> &Message {
        let prompt = self.build_prompt();
        match client.complete(&prompt) {
            Ok(reply) => {
                self.messages
                    .push(Message::new(Role::Assistant, reply, MessageStatus::Sent));
                &self.messages[self.messages.len() - 1]
            }
            Err(e) => {
                log::warn!("assistant completion failed: {}", e);
                self.push_assistant_error(fallback_reply(&e))
            }
        }
    }

    fn push_assistant_error(&mut self, text: &str) -> &Message {
        self.messages
            .push(Message::new(Role::Assistant, text, MessageStatus::Error));
        &self.messages[self.messages.len() - 1]
    }

    /// Render the log for the provider: system prompt first, then every turn.
    fn build_prompt(&self) -> Vec<PromptMessage> {
        let mut prompt = vec![PromptMessage {
            role: PromptRole::System,
            content: PromptContent::Text(self.system_prompt.clone()),
        }];
        prompt.extend(self.messages.iter().map(render_message));
        prompt
    }
}

/// Render one log entry into the provider's shape. User messages carrying
/// images become multi-part content; text-like attachments are inlined under
/// an "Attached files" banner.
fn render_message(message: &Message) -> PromptMessage {
    let role = match message.role {
        Role::User => PromptRole::User,
        Role::Assistant => PromptRole::Assistant,
    };

    if message.role == Role::User {
        let images: Vec<&Attachment> =
            message.attachments.iter().filter(|a| a.is_image()).collect();
        if !images.is_empty() {
            let mut parts = vec![PromptPart::Text(message.content.clone())];
            parts.extend(images.into_iter().map(|image| PromptPart::Image {
                locator: image.path.display().to_string(),
            }));
            return PromptMessage {
                role,
                content: PromptContent::Parts(parts),
            };
        }

        let inlined: Vec<&Attachment> = message
            .attachments
            .iter()
            .filter(|a| a.text.is_some())
            .collect();
        if !inlined.is_empty() {
            let mut text = message.content.clone();
            text.push_str("\n\nAttached files:\n");
            for attachment in inlined {
                if let Some(ref content) = attachment.text {
                    text.push_str(&format!("\n--- {} ---\n{}\n", attachment.name, content));
                }
            }
            return PromptMessage {
                role,
                content: PromptContent::Text(text),
            };
        }
    }

    PromptMessage {
        role,
        content: PromptContent::Text(message.content.clone()),
    }
}

fn fallback_reply(error: &ClientError) -> &'static str {
    match error {
        ClientError::Unconfigured => {
            "The assistant API key is not configured yet. Add one and try again."
        }
        ClientError::QuotaExceeded => {
            "The assistant's usage quota has been exhausted. Please check the account limits."
        }
        ClientError::RateLimited => {
            "Too many requests right now. Please wait a moment before sending another message."
        }
        ClientError::Api(_) => {
            "Sorry, something went wrong while handling that message. Please try again."
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::PathBuf;

    use parking_lot::Mutex;

    use super::*;
    use crate::models::format::EncodingFormat;

    #[derive(Default)]
    struct MockClient {
        completions: Mutex<VecDeque<Result<String, ClientError>>>,
        transcriptions: Mutex<VecDeque<Result<String, ClientError>>>,
        last_prompt: Mutex<Option<Vec<PromptMessage>>>,
    }

    impl MockClient {
        fn replying(reply: &str) -> Self {
            let client = Self::default();
            client.completions.lock().push_back(Ok(reply.to_string()));
            client
        }

        fn failing_with(error: ClientError) -> Self {
            let client = Self::default();
            client.completions.lock().push_back(Err(error));
            client
        }

        fn prompt(&self) -> Vec<PromptMessage> {
            self.last_prompt.lock().clone().expect("no prompt captured")
        }
    }

    impl AssistantClient for MockClient {
        fn complete(&self, prompt: &[PromptMessage]) -> Result<String, ClientError> {
            *self.last_prompt.lock() = Some(prompt.to_vec());
            self.completions
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()))
        }

        fn transcribe(&self, _recording: &RecordingArtifact) -> Result<String, ClientError> {
            self.transcriptions
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("transcript".to_string()))
        }

        fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, ClientError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    fn artifact() -> RecordingArtifact {
        RecordingArtifact {
            id: "rec-1".into(),
            payload: vec![0; 8],
            path: PathBuf::from("/tmp/recording_rec-1.wav"),
            format: EncodingFormat::Wav,
            duration_secs: 0.3,
            checksum: "deadbeef".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn text_attachment(name: &str, content: &str) -> Attachment {
        Attachment {
            id: "att-1".into(),
            name: name.into(),
            mime_type: "text/plain".into(),
            size: content.len() as u64,
            path: PathBuf::from(name),
            text: Some(content.into()),
        }
    }

    fn image_attachment(name: &str) -> Attachment {
        Attachment {
            id: "att-2".into(),
            name: name.into(),
            mime_type: "image/png".into(),
            size: 4,
            path: PathBuf::from(name),
            text: None,
        }
    }

    #[test]
    fn send_text_appends_user_and_assistant_turns() {
        let client = MockClient::replying("hello back");
        let mut convo = Conversation::default();

        let reply = convo.send_text(&client, "hello", Vec::new());
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "hello back");
        assert_eq!(reply.status, MessageStatus::Sent);

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
    }

    #[test]
    fn system_prompt_leads_the_rendered_prompt() {
        let client = MockClient::replying("ok");
        let mut convo = Conversation::new("be terse");
        convo.send_text(&client, "hi", Vec::new());

        let prompt = client.prompt();
        assert_eq!(prompt[0].role, PromptRole::System);
        assert_eq!(prompt[0].content, PromptContent::Text("be terse".into()));
        assert_eq!(prompt[1].role, PromptRole::User);
    }

    #[test]
    fn client_failure_becomes_error_status_message() {
        let client = MockClient::failing_with(ClientError::Unconfigured);
        let mut convo = Conversation::default();

        let reply = convo.send_text(&client, "hi", Vec::new());
        assert_eq!(reply.status, MessageStatus::Error);
        assert!(reply.content.contains("not configured"));
        assert_eq!(convo.messages().len(), 2);
    }

    #[test]
    fn rate_limit_gets_its_own_fallback_text() {
        let client = MockClient::failing_with(ClientError::RateLimited);
        let mut convo = Conversation::default();

        let reply = convo.send_text(&client, "hi", Vec::new());
        assert!(reply.content.contains("wait a moment"));
    }

    #[test]
    fn send_recording_uses_transcript_and_keeps_audio_locator() {
        let client = MockClient::replying("heard you");
        client
            .transcriptions
            .lock()
            .push_back(Ok("remind me to water the plants".into()));
        let mut convo = Conversation::default();

        let recording = artifact();
        convo.send_recording(&client, &recording);

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "remind me to water the plants");
        assert_eq!(messages[0].audio_path.as_deref(), Some(recording.path.as_path()));
        assert_eq!(messages[1].content, "heard you");
    }

    #[test]
    fn transcription_failure_appends_error_without_user_message() {
        let client = MockClient::default();
        client
            .transcriptions
            .lock()
            .push_back(Err(ClientError::Api("bad audio".into())));
        let mut convo = Conversation::default();

        let reply = convo.send_recording(&client, &artifact());
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.status, MessageStatus::Error);
        assert_eq!(convo.messages().len(), 1);
    }

    #[test]
    fn text_attachments_are_inlined_into_the_prompt() {
        let client = MockClient::replying("ok");
        let mut convo = Conversation::default();
        convo.send_text(
            &client,
            "summarize this",
            vec![text_attachment("notes.txt", "milk, eggs")],
        );

        let prompt = client.prompt();
        match &prompt[1].content {
            PromptContent::Text(text) => {
                assert!(text.contains("Attached files:"));
                assert!(text.contains("--- notes.txt ---"));
                assert!(text.contains("milk, eggs"));
            }
            other => panic!("expected inlined text, got {:?}", other),
        }
    }

    #[test]
    fn image_attachments_become_prompt_parts() {
        let client = MockClient::replying("a cat");
        let mut convo = Conversation::default();
        convo.send_text(
            &client,
            "what is this?",
            vec![image_attachment("cat.png")],
        );

        let prompt = client.prompt();
        match &prompt[1].content {
            PromptContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], PromptPart::Text(_)));
                assert!(matches!(parts[1], PromptPart::Image { .. }));
            }
            other => panic!("expected parts, got {:?}", other),
        }
    }

    #[test]
    fn speak_synthesizes_message_content() {
        let client = MockClient::replying("read me aloud");
        let mut convo = Conversation::default();
        convo.send_text(&client, "hi", Vec::new());

        let id = convo.messages()[1].id.clone();
        let audio = convo.speak(&client, &id).unwrap();
        assert_eq!(audio, b"read me aloud");
    }

    #[test]
    fn speak_unknown_message_fails() {
        let client = MockClient::default();
        let convo = Conversation::default();
        assert!(matches!(
            convo.speak(&client, "nope"),
            Err(ClientError::Api(_))
        ));
    }

    #[test]
    fn clear_empties_the_log() {
        let client = MockClient::replying("ok");
        let mut convo = Conversation::default();
        convo.send_text(&client, "hi", Vec::new());
        assert!(!convo.messages().is_empty());

        convo.clear();
        assert!(convo.messages().is_empty());
    }
}
