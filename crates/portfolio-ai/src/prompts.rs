//! Prompt templates sent to the language model.
//!
//! The site publishes in Indonesian, so every prompt is written in it.

use chrono::NaiveDate;

const RESPONSE_FORMAT: &str = "Format response:\n---DESCRIPTION---\n[deskripsi singkat artikel]\n---CONTENT---\n[konten artikel dalam HTML]";

const REVISED_RESPONSE_FORMAT: &str = "Format response:\n---DESCRIPTION---\n[deskripsi singkat artikel yang sudah diperbaiki]\n---CONTENT---\n[konten artikel HTML yang sudah diperbaiki]";

/// Date rendered the way the prompts expect, e.g. `2 January 2026`.
pub fn prompt_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Ask for `total` titles, about `keyword` when one is given.
pub fn titles(keyword: &str, total: usize, date: NaiveDate) -> String {
    let today = prompt_date(date);
    if keyword.trim().is_empty() {
        format!(
            "Kamu adalah editor blog teknologi profesional Indonesia.\n\
             Hari ini tanggal {today}.\n\n\
             Buat {total} judul artikel blog teknologi terkini dalam Bahasa Indonesia.\n\n\
             ATURAN KETAT:\n\
             - Topik: AI, cloud computing, programming, cybersecurity, startup Indonesia, mobile dev\n\
             - Judul harus REALISTIS, faktual, bisa dicari referensinya\n\
             - JANGAN buat judul fiksi atau spekulasi liar\n\
             - Singkat, jelas, SEO-friendly, maksimal 10 kata per judul\n\
             - JANGAN tambahkan nomor, tanda strip, atau penjelasan\n\n\
             Balas HANYA daftar judul, satu per baris."
        )
    } else {
        format!(
            "Kamu adalah editor blog profesional Indonesia.\n\
             Hari ini tanggal {today}.\n\n\
             Buat {total} judul artikel blog dalam Bahasa Indonesia berdasarkan topik: \"{keyword}\"\n\n\
             ATURAN KETAT:\n\
             - Judul harus REALISTIS dan FAKTUAL, bukan fiksi atau spekulasi liar\n\
             - Fokus pada fakta, berita, analisis, atau panduan praktis\n\
             - JANGAN buat judul tentang skenario fiktif (seperti \"di luar angkasa\", \"di masa depan 2050\", dll)\n\
             - JANGAN buat judul tentang event yang sudah selesai di masa lalu\n\
             - Judul harus bisa dicari di internet dan punya referensi nyata\n\
             - Singkat, jelas, SEO-friendly, maksimal 10 kata per judul\n\
             - JANGAN tambahkan nomor, tanda strip, atau penjelasan\n\n\
             Balas HANYA daftar judul, satu per baris."
        )
    }
}

/// Ask for a full article about `title`, grounded on `references`.
pub fn article(title: &str, references: &[String]) -> String {
    let mut refs = String::new();
    for (i, reference) in references.iter().enumerate() {
        refs.push_str(&format!("=== Referensi {} ===\n{}\n\n", i + 1, reference));
    }

    format!(
        "Kamu adalah Aibys, AI Assistant dari Arlchoose yang bertugas menulis artikel blog teknologi dalam Bahasa Indonesia.\n\n\
         Judul artikel yang harus kamu tulis: \"{title}\"\n\n\
         Berikut adalah referensi artikel yang bisa kamu gunakan sebagai sumber informasi:\n\
         {refs}\n\n\
         Instruksi penulisan:\n\
         - Tulis artikel yang informatif dan menarik dalam Bahasa Indonesia\n\
         - JANGAN menyalin atau memparafrase referensi secara langsung, tulis dengan gaya dan perspektifmu sendiri\n\
         - Gunakan informasi dari referensi sebagai dasar fakta, tapi sampaikan dengan cara yang unik\n\
         - Format artikel menggunakan HTML (gunakan tag h2, h3, p, ul, li, strong, em)\n\
         - Panjang artikel minimal 500 kata\n\
         - Sertakan intro yang menarik dan kesimpulan yang berkesan\n\
         - Tulis deskripsi singkat (1-2 kalimat) di awal sebelum konten HTML, pisahkan dengan tanda \"---DESCRIPTION---\" dan \"---CONTENT---\"\n\n\
         {RESPONSE_FORMAT}"
    )
}

pub fn tags(title: &str) -> String {
    format!(
        "Berikan 3-5 tag yang relevan untuk artikel berjudul: \"{title}\"\n\
         Balas HANYA dengan nama tag, satu per baris, huruf kecil, tanpa penjelasan.\n\
         Contoh:\ngolang\nbackend\ntutorial"
    )
}

/// Ask for a revision of a rejected article following the reviewer's note.
pub fn revision(title: &str, description: &str, content: &str, comment: &str) -> String {
    format!(
        "Kamu adalah Aibys, AI Assistant dari Arlchoose.\n\n\
         Kamu sebelumnya menulis artikel berjudul: \"{title}\"\n\n\
         Deskripsi sebelumnya:\n{description}\n\n\
         Konten artikel sebelumnya:\n{content}\n\n\
         Artikel ini ditolak dengan catatan berikut dari editor:\n\"{comment}\"\n\n\
         Tugasmu: Perbaiki artikel di atas sesuai catatan yang diberikan.\n\n\
         Instruksi:\n\
         - Perbaiki SESUAI catatan penolakan, jangan abaikan\n\
         - Tetap tulis dalam Bahasa Indonesia\n\
         - Format menggunakan HTML (h2, h3, p, ul, li, strong, em)\n\
         - JANGAN gunakan backtick atau markdown, HANYA HTML murni\n\
         - JANGAN ubah judul artikel\n\
         - Pertahankan fakta dan informasi yang sudah benar\n\n\
         {REVISED_RESPONSE_FORMAT}"
    )
}
