//! User-facing Turkish replies and the inline keyboards that go with them.

use asistan_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const ONBOARDING: &str = "🚗 Araba Satış Asistanına Hoş Geldiniz!\n\n\
Ben sizin kişisel araba satış asistanınızım.\n\
Neler yapabilirim:\n\n\
💰 Finansal takip\n\
⏰ Hatırlatıcılar\n\
📅 Google Takvim\n\
🤖 Sohbet ve danışmanlık\n\n\
FİNANSAL TAKİP:\n\
• '350.000 TL Civic sattım'\n\
• '15.000 TL galeri kirası ödedim'\n\
• '500 TL yakıt aldım'\n\n\
RAPORLAR:\n\
• 'Bu hafta ne kadar kazandım?'\n\
• 'Aylık durum raporu'\n\n\
HATIRLATICILAR:\n\
• 'Yarın saat 14:30 noter randevusu'\n\
• '2 saat sonra müşteriyi ara'\n\n\
💡 Komut yazmaya gerek yok, doğal dilde yazın!";

pub const TUTORIAL: &str = "🚗 Araba Satış Asistanı Rehberi\n\n\
TEMEL KULLANIM:\n\n\
💰 Mali işlemler için:\n\
• '350.000 TL Civic sattım'\n\
• '500 TL yakıt aldım'\n\
• '15.000 TL kira ödedim'\n\n\
📊 Raporlar için:\n\
• 'Bu hafta ne kadar kazandım?'\n\
• 'Bu ay galeri durum nasıl?'\n\n\
⏰ Hatırlatıcılar için:\n\
• 'Yarın 10:00 sigorta yenile'\n\
• '30 dakika sonra teklif gönder'\n\n\
💡 Komut yazmaya gerek yok!";

pub const ONBOARD_COMPLETE: &str = "🎉 Harika! Artık botu kullanmaya hazırsın.\n\n\
Bana doğal dilde yazabilirsin:\n\
• '500 TL yakıt aldım'\n\
• 'Bu hafta ne kadar kazandım?'\n\
• 'Yarın saat 9 müşteriyi ara'";

pub const HELP: &str = "🤖 Araba Satış Asistanı Yardım\n\n\
💰 FİNANSAL İŞLEMLER:\n\
• '500 TL benzin aldım'\n\
• '350.000 TL araba sattım'\n\
• 'Bu hafta ne kadar kazandım?'\n\
• 'Bu ay ev harcamaları raporu'\n\n\
⏰ HATIRLATICILAR:\n\
• 'Yarın saat 14:30 toplantı'\n\
• '2 saat sonra alışveriş'\n\n\
⚡ KOMUTLAR:\n\
/start - Ana menü\n\
/yardim - Bu yardım menüsü\n\
/gorev_ekle [başlık] - Yeni görev ekle\n\
/gorevler - Aktif görevleri listele\n\
/gorev_tamam [ID] - Görevi tamamla\n\
/not_ekle [başlık] [içerik] - Not ekle\n\
/notlar - Notları listele\n\
/hatirlaticilar - Bekleyen hatırlatıcılar\n\
/yeni - Sohbeti sıfırla\n\n\
💡 Komut yazmaya gerek yok, doğal dilde konuş!";

pub const QUICK_HELP: &str = "🤖 Hızlı Yardım\n\n\
💰 Finansal: '500 TL benzin aldım'\n\
📊 Rapor: 'Bu hafta ne kadar kazandım?'\n\
⏰ Hatırlatma: 'Yarın 10:00 noter'\n\n\
Detaylı yardım: /yardim";

pub const NOT_UNDERSTOOD: &str = "🤔 Ne yapmaya çalıştığınızı anlayamadım.\n\n\
💡 Şunları deneyebilirsiniz:\n\
• '500 TL yakıt aldım' - Mali işlem\n\
• 'Bu hafta ne kadar kazandım?' - Mali rapor\n\n\
❓ Yardım için /yardim yazabilirsiniz.";

pub const APOLOGY: &str = "❌ Bir hata oluştu. Lütfen tekrar deneyin.";
pub const TRANSACTION_FAILED: &str = "❌ İşlem kaydedilemedi. Lütfen tekrar deneyin.";

pub const REMINDER_USAGE: &str = "⏰ Ne zaman hatırlatayım?\n\n\
Örnekler:\n\
• 'Yarın saat 14:30 toplantı'\n\
• 'Bugün 18:00 müşteriyi ara'\n\
• '2 saat sonra alışveriş'\n\
• '3 gün sonra 10:00 muayene'";
pub const REMINDER_TOO_SHORT: &str =
    "⏰ Hatırlatma mesajı çok kısa. Neyi hatırlatmamı istediğinizi de yazın.";
pub const CALENDAR_FAILED: &str = "⚠️ Takvime eklenemedi.";
pub const NO_PENDING_REMINDERS: &str = "📭 Bekleyen hatırlatıcınız yok!";

pub const CALENDAR_NOT_CONFIGURED: &str = "📅 Google Takvim entegrasyonu yapılandırılmamış.";
pub const CALENDAR_CONNECTED: &str =
    "📅 Google Takvim zaten bağlı. Hatırlatıcılarınız takvime de eklenecek.";
pub const CALENDAR_CONNECT: &str =
    "📅 Google Takvim'i bağlamak için aşağıdaki bağlantıya tıklayın. \
     Bağlandıktan sonra hatırlatıcılarınız takvime de eklenecek.";

pub const CHAT_RESET: &str = "🔄 Yeni bir sohbet başlattık. Önceki konuşmayı unuttum.";

pub const TASK_ADD_USAGE: &str = "📝 Kullanım: /gorev_ekle [görev başlığı]";
pub const TASK_DONE_USAGE: &str = "✅ Kullanım: /gorev_tamam [görev ID]";
pub const TASK_INVALID_ID: &str = "❌ Geçersiz ID! Sadece sayı girin.";
pub const TASK_NOT_FOUND: &str = "❌ Bu ID'ye sahip görev bulunamadı!";
pub const NO_TASKS: &str = "📭 Aktif göreviniz bulunmuyor!";
pub const NOTE_ADD_USAGE: &str = "📝 Kullanım: /not_ekle [başlık] [içerik]";
pub const NO_NOTES: &str = "📭 Henüz not bulunmuyor!";

/// Commands registered in the Telegram menu.
pub const COMMANDS: &[(&str, &str)] = &[
    ("start", "Ana menü"),
    ("yardim", "Yardım menüsü"),
    ("gorev_ekle", "Yeni görev ekle"),
    ("gorevler", "Aktif görevler"),
    ("gorev_tamam", "Görevi tamamla"),
    ("not_ekle", "Not ekle"),
    ("notlar", "Son notlar"),
    ("hatirlaticilar", "Bekleyen hatırlatıcılar"),
    ("yeni", "Sohbeti sıfırla"),
];

pub fn welcome(first_name: &str) -> String {
    format!(
        "🚗 Hoş geldin {first_name}!\n\n\
         Ben senin araba satış asistanınım. Ne yapmak istiyorsun?\n\n\
         💡 Doğal dilde yazabilirsin:\n\
         • '500 TL yakıt aldım'\n\
         • 'Bu hafta ne kadar kazandım?'"
    )
}

pub fn onboarding_keyboard(label: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column([InlineKeyboardButton::callback(label, "onboard_complete")])
}

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                InlineKeyboardButton::callback("💰 Mali Durum", "financial_summary"),
                InlineKeyboardButton::callback("📊 Haftalık Rapor", "weekly_report"),
            ],
            vec![
                InlineKeyboardButton::callback("❓ Yardım", "help"),
                InlineKeyboardButton::callback("🎓 Rehber", "tutorial"),
            ],
        ],
    }
}

pub fn report_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::callback("💰 Mali Durum", "financial_summary"),
            InlineKeyboardButton::callback("📊 Haftalık Rapor", "weekly_report"),
        ]],
    }
}

pub fn help_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::callback("❓ Yardım", "help"),
            InlineKeyboardButton::callback("🎓 Rehber", "tutorial"),
        ]],
    }
}

pub fn weekly_summary_button() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::column([InlineKeyboardButton::callback("📊 Bu Hafta Özet", "weekly_report")])
}

pub fn reminder_set(when: &str, message: &str) -> String {
    format!("⏰ Hatırlatıcı kuruldu!\n\n📅 {when}\n📝 {message}")
}

pub fn task_added(title: &str, id: i64) -> String {
    format!("✅ Görev eklendi!\n📝 {title}\n🆔 ID: {id}")
}

pub fn task_completed(title: &str) -> String {
    format!("🎉 Görev tamamlandı!\n📝 {title}")
}

pub fn note_saved(title: &str, id: i64) -> String {
    format!("📝 Not kaydedildi!\n{title}\n🆔 ID: {id}")
}
