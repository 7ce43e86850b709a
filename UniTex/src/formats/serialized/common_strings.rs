//! Built-in type-tree string table
//!
//! Blob type trees reference frequent names by offset into this table
//! (high bit of the offset set) instead of storing them locally.

/// NUL-separated table, in engine order. Offsets are byte positions.
const COMMON_STRINGS: &str = "AABB\0AnimationClip\0AnimationCurve\0AnimationState\0Array\0Base\0\
BitField\0bitset\0bool\0char\0ColorRGBA\0Component\0data\0deque\0double\0dynamic_array\0\
FastPropertyName\0first\0float\0Font\0GameObject\0Generic Mono\0GradientNEW\0GUID\0GUIStyle\0\
int\0list\0long long\0map\0Matrix4x4f\0MdFour\0MonoBehaviour\0MonoScript\0m_ByteSize\0m_Curve\0\
m_EditorClassIdentifier\0m_EditorHideFlags\0m_Enabled\0m_ExtensionPtr\0m_GameObject\0m_Index\0\
m_IsArray\0m_IsStatic\0m_MetaFlag\0m_Name\0m_ObjectHideFlags\0m_PrefabInternal\0\
m_PrefabParentObject\0m_Script\0m_StaticEditorFlags\0m_Type\0m_Version\0Object\0pair\0\
PPtr<Component>\0PPtr<GameObject>\0PPtr<Material>\0PPtr<MonoBehaviour>\0PPtr<MonoScript>\0\
PPtr<Object>\0PPtr<Prefab>\0PPtr<Sprite>\0PPtr<TextAsset>\0PPtr<Texture>\0PPtr<Texture2D>\0\
PPtr<Transform>\0Prefab\0Quaternionf\0Rectf\0RectInt\0RectOffset\0second\0set\0short\0size\0\
SInt16\0SInt32\0SInt64\0SInt8\0staticvector\0string\0TextAsset\0TextMesh\0Texture\0Texture2D\0\
Transform\0TypelessData\0UInt16\0UInt32\0UInt64\0UInt8\0unsigned int\0unsigned long long\0\
unsigned short\0vector\0Vector2f\0Vector3f\0Vector4f\0m_ScriptingClassIdentifier\0Gradient\0\
Type*\0int2_storage\0int3_storage\0BoundsInt\0m_CorrespondingSourceObject\0m_PrefabInstance\0\
m_PrefabAsset\0FileSize\0Hash128\0";

/// Look up the common string starting at `offset`.
pub fn common_string(offset: u32) -> Option<&'static str> {
    let start = offset as usize;
    let rest = COMMON_STRINGS.get(start..)?;
    if start > 0 && COMMON_STRINGS.as_bytes()[start - 1] != 0 {
        return None;
    }
    rest.split('\0').next().filter(|s| !s.is_empty())
}

/// Offset of `name` in the common table, if it is one of the built-ins.
pub fn common_offset(name: &str) -> Option<u32> {
    let mut offset = 0usize;
    for entry in COMMON_STRINGS.split('\0') {
        if entry == name && !entry.is_empty() {
            return u32::try_from(offset).ok();
        }
        offset += entry.len() + 1;
    }
    None
}
