// ============================================================
// Layer 4 — Segmentation Lexicon
// ============================================================
// Multi-syllable Vietnamese words the longest-match segmenter may
// glue together. Vietnamese writes every syllable as a separate
// space-delimited unit, so "sức khỏe" (health) arrives as two
// pieces and only a dictionary can tell that they form one word.
//
// Entries are stored NFC-normalised, lower-cased, with single
// spaces between syllables. Single-syllable entries are ignored.

use std::collections::HashSet;

use crate::data::preprocessor::Preprocessor;

/// Bundled word list: general vocabulary plus the health and traffic
/// domains the service was first deployed for.
const BUILTIN_LEXICON: &[&str] = &[
    // ── general ──
    "ví dụ", "câu hỏi", "trả lời", "thông tin", "vấn đề", "cảm ơn", "xin chào",
    "xin lỗi", "bây giờ", "hôm nay", "hôm qua", "ngày mai", "buổi sáng", "buổi tối",
    "thời gian", "hàng ngày", "thường xuyên", "đặc biệt", "quan trọng", "cần thiết",
    "có thể", "không thể", "bao nhiêu", "như thế nào", "tại sao", "ở đâu", "khi nào",
    "người dân", "gia đình", "trẻ em", "người lớn", "người cao tuổi", "phụ nữ",
    "nam giới", "học sinh", "sinh viên", "công ty", "nhà nước", "chính phủ",
    "thành phố", "hà nội", "hồ chí minh", "việt nam", "tiếng việt", "điện thoại",
    "máy tính", "tài liệu", "kết quả", "hướng dẫn", "quy định", "theo dõi",
    "lựa chọn", "phù hợp", "hiệu quả", "tham khảo", "tư vấn", "chuyên gia",
    // ── health ──
    "sức khỏe", "sức khoẻ", "bệnh viện", "bác sĩ", "y tá", "phòng khám", "cấp cứu",
    "khẩn cấp", "triệu chứng", "điều trị", "thuốc men", "đau đầu", "nhức đầu",
    "đau bụng", "đau ngực", "đau lưng", "đau họng", "viêm họng", "ho khan",
    "sốt cao", "sốt nhẹ", "cảm cúm", "cảm lạnh", "buồn nôn", "nôn mửa", "chóng mặt",
    "mệt mỏi", "uể oải", "mất ngủ", "khó ngủ", "khó thở", "thở gấp", "căng thẳng",
    "lo âu", "lo lắng", "trầm cảm", "tâm lý", "tinh thần", "huyết áp", "tiểu đường",
    "tim mạch", "đột quỵ", "tai biến", "co giật", "bất tỉnh", "chấn thương",
    "miễn dịch", "dinh dưỡng", "chế độ ăn", "ăn uống", "thức ăn", "thực phẩm",
    "rau xanh", "trái cây", "hoa quả", "chất xơ", "chất béo", "vi khuẩn", "vắc xin",
    "thể dục", "tập thể dục", "thể thao", "vận động", "đi bộ", "chạy bộ", "bơi lội",
    "tập tạ", "cơ bắp", "giảm cân", "tăng cân", "nghỉ ngơi", "giấc ngủ", "nhiệt độ",
    "dạ dày", "tiêu hóa", "khó tiêu", "hô hấp", "phòng ngừa", "phòng bệnh",
    "nguy hiểm", "nghiêm trọng", "dữ dội", "kéo dài", "uống thuốc", "khám bệnh",
    // ── traffic law ──
    "giao thông", "luật giao thông", "an toàn giao thông", "đường bộ", "đèn đỏ",
    "đèn tín hiệu", "tín hiệu", "biển báo", "vạch kẻ đường", "làn đường", "vỉa hè",
    "xe máy", "xe đạp", "ô tô", "xe tải", "xe khách", "phương tiện", "người đi bộ",
    "giấy phép lái xe", "bằng lái", "đăng ký xe", "mũ bảo hiểm", "nồng độ cồn",
    "tốc độ", "vượt đèn đỏ", "vượt quá tốc độ", "quá tốc độ", "xử phạt", "phạt tiền",
    "mức phạt", "vi phạm", "cảnh sát", "cảnh sát giao thông", "tạm giữ", "tước bằng",
    "nghị định", "điều khiển", "lái xe", "dừng xe", "đỗ xe", "quay đầu", "rẽ trái",
    "rẽ phải", "ngã tư", "cao tốc", "đường cao tốc", "tai nạn", "va chạm",
    "bảo hiểm", "trách nhiệm", "dân sự", "kiểm định", "đường sắt",
];

/// Lookup set for the longest-match segmenter.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries:       HashSet<String>,
    max_syllables: usize,
}

impl Lexicon {
    /// Build a lexicon from raw entries. Underscores count as syllable
    /// separators so `"sức_khỏe"` and `"sức khỏe"` are the same entry.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lexicon = Lexicon::default();
        lexicon.extend(entries);
        lexicon
    }

    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_LEXICON.iter().copied())
    }

    /// Add more entries, normalised the same way as `from_entries`.
    pub fn extend<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prep = Preprocessor::new();
        for raw in entries {
            let normalised = prep.normalize_unicode(&raw.replace('_', " "));
            let syllables: Vec<String> = normalised
                .split_whitespace()
                .map(|s| s.to_lowercase())
                .collect();
            if syllables.len() < 2 {
                continue;
            }
            self.max_syllables = self.max_syllables.max(syllables.len());
            self.entries.insert(syllables.join(" "));
        }
    }

    /// `key` is lower-cased syllables joined by single spaces.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Syllable count of the longest entry.
    pub fn max_syllables(&self) -> usize {
        self.max_syllables
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
