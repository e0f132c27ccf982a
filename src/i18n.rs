use crate::config::Language;

/// Operator-facing strings for one language.
#[derive(Debug, Clone, Copy)]
pub struct Texts {
    pub help: &'static str,
    pub unknown_command: &'static str,
    pub no_hosts_available: &'static str,
    pub no_hosts_registered: &'static str,
    pub select_host: &'static str,
    pub status_header: &'static str,
    pub online: &'static str,
    pub offline: &'static str,
    pub last_activity: &'static str,
    pub report_error: &'static str,
    pub report: ReportTexts,
    minutes_ago: fn(i64) -> String,
}

/// Section titles and labels of the system report.
#[derive(Debug, Clone, Copy)]
pub struct ReportTexts {
    pub title: &'static str,
    pub computer: &'static str,
    pub time: &'static str,
    pub network: &'static str,
    pub hostname: &'static str,
    pub local_ip: &'static str,
    pub external_ip: &'static str,
    pub cpu: &'static str,
    pub cores: &'static str,
    pub load: &'static str,
    pub memory: &'static str,
    pub total: &'static str,
    pub used: &'static str,
    pub available: &'static str,
    pub free: &'static str,
    pub disks: &'static str,
    pub top_cpu: &'static str,
    pub top_memory: &'static str,
    /// Byte units from B to PB.
    pub units: [&'static str; 6],
}

impl Texts {
    pub fn for_language(language: Language) -> &'static Texts {
        match language {
            Language::Ru => &RU,
            Language::En => &EN,
        }
    }

    pub fn minutes_ago(&self, minutes: i64) -> String {
        (self.minutes_ago)(minutes)
    }
}

fn ru_minutes_ago(minutes: i64) -> String {
    let last_two = minutes % 100;
    let last = minutes % 10;
    let word = if (11..=14).contains(&last_two) {
        "минут"
    } else if last == 1 {
        "минуту"
    } else if (2..=4).contains(&last) {
        "минуты"
    } else {
        "минут"
    };
    format!("{} {} назад", minutes, word)
}

fn en_minutes_ago(minutes: i64) -> String {
    if minutes == 1 {
        "1 minute ago".to_string()
    } else {
        format!("{} minutes ago", minutes)
    }
}

static RU: Texts = Texts {
    help: "📖 <b>Доступные команды:</b>\n\n\
           /info - Получить подробную информацию о компьютере\n\
           /status - Краткий статус всех компьютеров\n\
           /help - Показать эту справку\n\n\
           💡 <b>Как использовать:</b>\n\
           1. Отправьте /info\n\
           2. Выберите компьютер из списка\n\
           3. Получите полный отчет",
    unknown_command: "Неизвестная команда. Используйте /help для списка команд.",
    no_hosts_available: "Нет доступных компьютеров",
    no_hosts_registered: "Нет зарегистрированных компьютеров",
    select_host: "Выберите компьютер:",
    status_header: "📊 <b>Статус компьютеров:</b>",
    online: "Online",
    offline: "Offline",
    last_activity: "Последняя активность",
    report_error: "Ошибка создания отчета",
    report: ReportTexts {
        title: "📊 <b>Отчет о состоянии системы</b>",
        computer: "🖥️ <b>Компьютер:</b>",
        time: "🕐 <b>Время:</b>",
        network: "🌐 <b>Сеть:</b>",
        hostname: "Имя хоста",
        local_ip: "Локальный IP",
        external_ip: "Внешний IP",
        cpu: "💻 <b>Процессор:</b>",
        cores: "Ядер",
        load: "Загрузка",
        memory: "🧠 <b>Память:</b>",
        total: "Всего",
        used: "Использовано",
        available: "Доступно",
        free: "Свободно",
        disks: "💾 <b>Диски:</b>",
        top_cpu: "⚡ <b>Топ процессы (CPU):</b>",
        top_memory: "🔥 <b>Топ процессы (Память):</b>",
        units: ["Б", "КБ", "МБ", "ГБ", "ТБ", "ПБ"],
    },
    minutes_ago: ru_minutes_ago,
};

static EN: Texts = Texts {
    help: "📖 <b>Available commands:</b>\n\n\
           /info - Detailed report for a computer\n\
           /status - Short status of all computers\n\
           /help - Show this help\n\n\
           💡 <b>How to use:</b>\n\
           1. Send /info\n\
           2. Pick a computer from the list\n\
           3. Receive the full report",
    unknown_command: "Unknown command. Use /help to list commands.",
    no_hosts_available: "No hosts available",
    no_hosts_registered: "No registered computers",
    select_host: "Select a computer:",
    status_header: "📊 <b>Computer status:</b>",
    online: "Online",
    offline: "Offline",
    last_activity: "Last activity",
    report_error: "Failed to build report",
    report: ReportTexts {
        title: "📊 <b>System status report</b>",
        computer: "🖥️ <b>Computer:</b>",
        time: "🕐 <b>Time:</b>",
        network: "🌐 <b>Network:</b>",
        hostname: "Hostname",
        local_ip: "Local IP",
        external_ip: "External IP",
        cpu: "💻 <b>CPU:</b>",
        cores: "Cores",
        load: "Load",
        memory: "🧠 <b>Memory:</b>",
        total: "Total",
        used: "Used",
        available: "Available",
        free: "Free",
        disks: "💾 <b>Disks:</b>",
        top_cpu: "⚡ <b>Top processes (CPU):</b>",
        top_memory: "🔥 <b>Top processes (memory):</b>",
        units: ["B", "KB", "MB", "GB", "TB", "PB"],
    },
    minutes_ago: en_minutes_ago,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_minutes() {
        let texts = Texts::for_language(Language::En);
        assert_eq!(texts.minutes_ago(15), "15 minutes ago");
        assert_eq!(texts.minutes_ago(1), "1 minute ago");
        assert_eq!(texts.minutes_ago(0), "0 minutes ago");
    }

    #[test]
    fn test_russian_plural_forms() {
        let texts = Texts::for_language(Language::Ru);
        assert_eq!(texts.minutes_ago(1), "1 минуту назад");
        assert_eq!(texts.minutes_ago(3), "3 минуты назад");
        assert_eq!(texts.minutes_ago(11), "11 минут назад");
        assert_eq!(texts.minutes_ago(15), "15 минут назад");
        assert_eq!(texts.minutes_ago(21), "21 минуту назад");
    }

    #[test]
    fn test_help_lists_all_commands() {
        for lang in [Language::Ru, Language::En] {
            let help = Texts::for_language(lang).help;
            for cmd in ["/info", "/status", "/help"] {
                assert!(help.contains(cmd), "{} help missing {}", lang, cmd);
            }
        }
    }
}
