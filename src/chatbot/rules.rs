use serde::Serialize;

use crate::store::Task;

/// Tag attached to every reply so the client can render it appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    TaskHelp,
    CleanupOffer,
    TaskList,
    Info,
    Personalization,
    CalendarHelp,
    GeneralHelp,
    Default,
    Assistant,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(rename = "type")]
    pub topic: Topic,
}

/// Live snapshot of the caller's tasks, consumed by the listing topic.
#[derive(Debug, Default)]
pub struct TaskSummary {
    pub active_count: usize,
    pub completed_count: usize,
    /// Up to five active tasks: title and optional due date.
    pub preview: Vec<(String, Option<String>)>,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let active: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
        let completed_count = tasks.len() - active.len();
        Self {
            active_count: active.len(),
            completed_count,
            preview: active
                .iter()
                .take(5)
                .map(|t| (t.title.clone(), t.due_date.clone()))
                .collect(),
        }
    }
}

type Handler = fn(Option<&TaskSummary>) -> ChatReply;

struct Rule {
    keywords: &'static [&'static str],
    handler: Handler,
}

/// Ordered rule table: the first group with any keyword contained in the
/// query wins. Order matters — "remove old tasks" belongs to the manage
/// group, not cleanup, because "remove" is checked first.
static RULES: &[Rule] = &[
    Rule {
        keywords: &["create", "add", "new task"],
        handler: create_help,
    },
    Rule {
        keywords: &["delete", "remove", "complete"],
        handler: manage_help,
    },
    Rule {
        keywords: &["cleanup", "clean up", "remove old", "delete old"],
        handler: cleanup_offer,
    },
    Rule {
        keywords: &["show", "list", "current tasks", "all tasks"],
        handler: task_list,
    },
    Rule {
        keywords: &["theme", "personalize", "customize", "settings"],
        handler: personalization,
    },
    Rule {
        keywords: &["calendar", "due date", "schedule"],
        handler: calendar_help,
    },
    Rule {
        keywords: &["help", "how to", "tutorial"],
        handler: general_help,
    },
];

/// Matches the lower-cased, trimmed query against the rule table; no match
/// falls through to the default help reply.
pub fn respond(query: &str, summary: Option<&TaskSummary>) -> ChatReply {
    let message = query.trim().to_lowercase();
    for rule in RULES {
        if rule.keywords.iter().any(|k| message.contains(k)) {
            return (rule.handler)(summary);
        }
    }
    fallback()
}

fn create_help(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "To create a new task:\n1. Type your task in the input field at the top\n\
                  2. Optionally select a due date\n3. Click 'Add' or press Enter\n\n\
                  You can also organize tasks into different lists like Personal or Work!"
            .into(),
        topic: Topic::TaskHelp,
    }
}

fn manage_help(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "To manage tasks:\n• Check the checkbox to mark as complete\n\
                  • Click the × button to delete a task\n\
                  • Completed tasks over 30 days old are automatically deleted\n\n\
                  You can view completed tasks in the 'All Tasks' view."
            .into(),
        topic: Topic::TaskHelp,
    }
}

fn cleanup_offer(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "I can help clean up old completed tasks! Tasks that have been completed for \
                  more than 30 days are automatically removed. If you'd like to manually trigger \
                  this cleanup, I can do that for you.\n\n\
                  Would you like me to clean up old completed tasks now?"
            .into(),
        topic: Topic::CleanupOffer,
    }
}

fn task_list(summary: Option<&TaskSummary>) -> ChatReply {
    let Some(summary) = summary else {
        return ChatReply {
            message: "I can help you view your tasks when you're logged in! Your current tasks \
                      will be displayed here with their due dates and completion status."
                .into(),
            topic: Topic::Info,
        };
    };

    let mut message = format!(
        "You currently have:\n• {} active tasks\n• {} completed tasks\n\n",
        summary.active_count, summary.completed_count
    );
    if !summary.preview.is_empty() {
        message.push_str("Active tasks:\n");
        for (title, due) in &summary.preview {
            match due {
                Some(due) => message.push_str(&format!("• {title} (Due: {due})\n")),
                None => message.push_str(&format!("• {title}\n")),
            }
        }
        if summary.active_count > summary.preview.len() {
            message.push_str(&format!(
                "... and {} more",
                summary.active_count - summary.preview.len()
            ));
        }
    }
    ChatReply {
        message,
        topic: Topic::TaskList,
    }
}

fn personalization(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "Personalization features:\n• Different task lists (Personal, Work, etc.)\n\
                  • Calendar view for due dates\n• Task organization and filtering\n\n\
                  More customization options are coming soon!"
            .into(),
        topic: Topic::Personalization,
    }
}

fn calendar_help(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "Calendar features:\n• Click 'Calendar' in the sidebar to view your tasks by \
                  date\n• Add due dates when creating tasks\n• See all tasks organized by their \
                  due dates\n• Navigate between months to plan ahead"
            .into(),
        topic: Topic::CalendarHelp,
    }
}

fn general_help(_: Option<&TaskSummary>) -> ChatReply {
    ChatReply {
        message: "Welcome to your To-Do App! Here's what you can do:\n\n\
                  📝 Manage Tasks:\n• Add new tasks with due dates\n• Mark tasks as complete\n\
                  • Delete tasks you no longer need\n\n\
                  📅 Calendar View:\n• See tasks organized by due date\n\
                  • Plan your schedule visually\n\n\
                  📋 Lists:\n• Organize tasks into different categories\n\
                  • Switch between Personal, Work, etc.\n\n\
                  Ask me anything specific!"
            .into(),
        topic: Topic::GeneralHelp,
    }
}

fn fallback() -> ChatReply {
    ChatReply {
        message: "I'm here to help with your To-Do app! You can ask me about:\n\
                  • How to create or delete tasks\n• Using the calendar feature\n\
                  • Organizing your tasks\n• App features and settings\n\n\
                  What would you like to know?"
            .into(),
        topic: Topic::Default,
    }
}
