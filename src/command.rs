use std::borrow::Cow;
use std::io;

use crate::error::DispatchError;

/// Raw form fields posted by the chat platform for a slash command.
///
/// Fields the platform sends that we don't care about (team_id,
/// response_url, trigger_id, ...) are ignored.
#[derive(Debug, Default)]
pub struct SlashForm {
    pub command: String,
    pub text: String,
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub channel_name: String,
}

impl SlashForm {
    /// Parse an `application/x-www-form-urlencoded` request body, plus the
    /// URL query string if there is one.
    ///
    /// A repeated key keeps its first value, and body values come before
    /// query values.
    pub fn parse(query: Option<&str>, body: &[u8]) -> Result<Self, DispatchError> {
        let mut pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| DispatchError::MalformedRequest(e.to_string()))?;
        if let Some(query) = query {
            let query_pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
                .map_err(|e| DispatchError::MalformedRequest(e.to_string()))?;
            pairs.extend(query_pairs);
        }
        Ok(Self::from_pairs(pairs))
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        // Walk backwards so the first occurrence of a key is written last.
        for (key, value) in pairs.into_iter().rev() {
            let field = match key.as_str() {
                "command" => &mut form.command,
                "text" => &mut form.text,
                "token" => &mut form.token,
                "user_id" => &mut form.user_id,
                "user_name" => &mut form.user_name,
                "channel_id" => &mut form.channel_id,
                "channel_name" => &mut form.channel_name,
                _ => continue,
            };
            *field = value;
        }
        form
    }
}

/// One slash-command invocation.
///
/// Handlers write their response into the command (it implements
/// [`io::Write`]); the dispatcher reads the output once the handler returns.
#[derive(Debug, Default)]
pub struct Command {
    /// Command name without the leading `/`
    pub name: String,
    pub text: String,
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub channel_id: String,
    pub channel_name: String,
    public: bool,
    buf: Vec<u8>,
}

impl Command {
    pub fn from_form(form: SlashForm) -> Result<Self, DispatchError> {
        let name = form
            .command
            .strip_prefix('/')
            .unwrap_or(&form.command)
            .to_string();
        if name.is_empty() {
            return Err(DispatchError::MissingCommand);
        }

        Ok(Self {
            name,
            text: form.text,
            token: form.token,
            user_id: form.user_id,
            user_name: form.user_name,
            channel_id: form.channel_id,
            channel_name: form.channel_name,
            public: false,
            buf: Vec::new(),
        })
    }

    /// Redirect the response to the public channel via the webhook.
    pub fn mark_public(&mut self) {
        self.public = true;
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Bytes written so far.
    pub fn snapshot(&self) -> &[u8] {
        &self.buf
    }

    /// Output as text, replacing invalid UTF-8.
    pub fn output_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.snapshot())
    }

    pub fn into_output(self) -> Vec<u8> {
        self.buf
    }
}

impl io::Write for Command {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
