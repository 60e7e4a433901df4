//! Closed name sets the loader treats specially, and the rules built on
//! them.

use crate::types::CommandLevel;

/// Extensions whose trampolines and terminators live in the hand-written
/// WSI code.
pub const WSI_EXT_NAMES: &[&str] = &[
    "VK_KHR_surface",
    "VK_KHR_display",
    "VK_KHR_xlib_surface",
    "VK_KHR_xcb_surface",
    "VK_KHR_wayland_surface",
    "VK_KHR_win32_surface",
    "VK_KHR_android_surface",
    "VK_MVK_macos_surface",
    "VK_MVK_ios_surface",
    "VK_EXT_headless_surface",
    "VK_EXT_metal_surface",
    "VK_FUCHSIA_imagepipe_surface",
    "VK_KHR_swapchain",
    "VK_KHR_display_swapchain",
    "VK_KHR_get_display_properties2",
    "VK_KHR_get_surface_capabilities2",
    "VK_QNX_screen_surface",
    "VK_NN_vi_surface",
    "VK_EXT_directfb_surface",
    "VK_OHOS_surface",
];

/// Global commands that still get a slot in the instance dispatch table.
pub const ADD_INST_CMDS: &[&str] = &[
    "vkCreateInstance",
    "vkEnumerateInstanceExtensionProperties",
    "vkEnumerateInstanceLayerProperties",
    "vkEnumerateInstanceVersion",
];

/// Commands that can be called before an instance exists.
pub const PRE_INSTANCE_FUNCTIONS: &[&str] = &[
    "vkEnumerateInstanceExtensionProperties",
    "vkEnumerateInstanceLayerProperties",
    "vkEnumerateInstanceVersion",
];

/// Extensions implemented by hand inside the loader.
pub const AVOID_EXT_NAMES: &[&str] = &["VK_EXT_debug_report"];

/// Commands implemented by hand inside the loader.
pub const AVOID_CMD_NAMES: &[&str] = &[
    "vkCreateDebugUtilsMessengerEXT",
    "vkDestroyDebugUtilsMessengerEXT",
    "vkSubmitDebugUtilsMessageEXT",
];

/// Extensions whose trampolines tolerate a driver without the command.
pub const NULL_CHECK_EXT_NAMES: &[&str] = &["VK_EXT_debug_utils"];

/// Device commands the loader post-processes on the way down.
pub const DEVICE_CMDS_NEED_TERM: &[&str] = &[
    "vkGetDeviceProcAddr",
    "vkCreateSwapchainKHR",
    "vkCreateSharedSwapchainsKHR",
    "vkGetDeviceGroupSurfacePresentModesKHR",
    "vkDebugMarkerSetObjectTagEXT",
    "vkDebugMarkerSetObjectNameEXT",
    "vkSetDebugUtilsObjectNameEXT",
    "vkSetDebugUtilsObjectTagEXT",
    "vkQueueBeginDebugUtilsLabelEXT",
    "vkQueueEndDebugUtilsLabelEXT",
    "vkQueueInsertDebugUtilsLabelEXT",
    "vkCmdBeginDebugUtilsLabelEXT",
    "vkCmdEndDebugUtilsLabelEXT",
    "vkCmdInsertDebugUtilsLabelEXT",
    "vkGetDeviceGroupSurfacePresentModes2EXT",
];

/// Device commands `vkGetDeviceProcAddr` answers with the trampoline
/// instead of the driver entry point, because layers may wrap the handles
/// they carry.
pub const DEVICE_CMDS_MUST_USE_TRAMP: &[&str] = &[
    "vkSetDebugUtilsObjectNameEXT",
    "vkSetDebugUtilsObjectTagEXT",
    "vkDebugMarkerSetObjectNameEXT",
    "vkDebugMarkerSetObjectTagEXT",
];

pub fn contains(set: &[&str], name: &str) -> bool {
    set.iter().any(|n| *n == name)
}

/// Debug-marker and debug-utils commands that name or tag an object.
pub fn is_debug_object_cmd(name: &str) -> bool {
    name.contains("DebugMarkerSetObject") || name.contains("SetDebugUtilsObject")
}

/// Whether the loader sits at the bottom of the call chain for `name`.
pub fn needs_terminator(name: &str, level: CommandLevel) -> bool {
    match level {
        CommandLevel::Instance | CommandLevel::PhysicalDevice => true,
        _ => contains(DEVICE_CMDS_NEED_TERM, name) || is_debug_object_cmd(name),
    }
}

/// Field of `loader_instance_extension_enable_list` for an extension, like
/// `khr_get_physical_device_properties2`.
pub fn enable_flag(extension: &str) -> String {
    extension
        .strip_prefix("VK_")
        .unwrap_or(extension)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_needs_terminator() {
        assert!(needs_terminator("vkGetPhysicalDeviceFeatures2", CommandLevel::PhysicalDevice));
        assert!(needs_terminator("vkDestroySurfaceKHR", CommandLevel::Instance));
        assert!(needs_terminator("vkCreateSwapchainKHR", CommandLevel::Device));
        assert!(needs_terminator("vkDebugMarkerSetObjectNameEXT", CommandLevel::Device));
        assert!(!needs_terminator("vkCmdDraw", CommandLevel::Device));
        assert!(!needs_terminator("vkCreateInstance", CommandLevel::Global));
    }

    #[test]
    fn test_enable_flag() {
        assert_eq!(
            enable_flag("VK_KHR_get_physical_device_properties2"),
            "khr_get_physical_device_properties2"
        );
    }
}
