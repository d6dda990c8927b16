use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ButtonRequest, KeyboardButton, KeyboardMarkup},
};

use crate::conversation::reply::{Button, Keyboard, Reply};
use crate::dispatcher::{ChatTransport, TransportError};

pub struct TelegramChatTransport {
    bot: Bot,
}

impl TelegramChatTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows = keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| match button {
                Button::Text(label) => KeyboardButton::new(label.clone()),
                Button::RequestLocation(label) => {
                    KeyboardButton::new(label.clone()).request(ButtonRequest::Location)
                }
            })
            .collect::<Vec<_>>()
    });

    let markup = KeyboardMarkup::new(rows).resize_keyboard();
    if keyboard.one_time {
        markup.one_time_keyboard()
    } else {
        markup
    }
}

#[async_trait]
impl ChatTransport for TelegramChatTransport {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError> {
        let request = self.bot.send_message(ChatId(chat_id), reply.text.clone());
        let result = match &reply.keyboard {
            Some(keyboard) => request.reply_markup(keyboard_markup(keyboard)).await,
            None => request.await,
        };

        result
            .map(|_| ())
            .map_err(|err| TransportError::Failed(err.to_string()))
    }
}
