//! Reply keyboards attached to outgoing messages.

use serde::Serialize;

/// Button color as understood by VK keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonColor {
    Primary,
    Secondary,
    Positive,
    Negative,
}

/// A single text button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub color: ButtonColor,
}

/// A one-time reply keyboard, laid out as rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub one_time: bool,
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn one_time() -> Self {
        Self {
            one_time: true,
            rows: vec![Vec::new()],
        }
    }

    /// Append a button to the current row.
    pub fn button(mut self, label: impl Into<String>, color: ButtonColor) -> Self {
        let button = Button {
            label: label.into(),
            color,
        };
        match self.rows.last_mut() {
            Some(row) => row.push(button),
            None => self.rows.push(vec![button]),
        }
        self
    }

    /// Start a new row.
    pub fn line(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }

    /// All labels in layout order.
    pub fn labels(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect()
    }

    /// VK keyboard JSON object.
    pub fn to_vk_json(&self) -> serde_json::Value {
        let buttons: Vec<Vec<serde_json::Value>> = self
            .rows
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .map(|b| {
                        serde_json::json!({
                            "action": { "type": "text", "label": b.label },
                            "color": b.color,
                        })
                    })
                    .collect()
            })
            .collect();

        serde_json::json!({
            "one_time": self.one_time,
            "buttons": buttons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_rows() {
        let kb = Keyboard::one_time()
            .button("A", ButtonColor::Primary)
            .button("B", ButtonColor::Secondary)
            .line()
            .button("C", ButtonColor::Negative);
        assert_eq!(kb.rows.len(), 2);
        assert_eq!(kb.labels(), vec!["A", "B", "C"]);
    }

    #[test]
    fn vk_json_shape() {
        let kb = Keyboard::one_time()
            .button("Старт", ButtonColor::Positive)
            .line();
        let json = kb.to_vk_json();
        assert_eq!(json["one_time"], true);
        // Trailing empty row is dropped.
        assert_eq!(json["buttons"].as_array().unwrap().len(), 1);
        assert_eq!(json["buttons"][0][0]["action"]["type"], "text");
        assert_eq!(json["buttons"][0][0]["action"]["label"], "Старт");
        assert_eq!(json["buttons"][0][0]["color"], "positive");
    }
}
